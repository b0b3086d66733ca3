#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use mo_reflect as reflect;
pub use mo_runtime as runtime;
pub use mo_utils as utils;
