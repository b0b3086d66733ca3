//! Dotted-path queries answered from declared types alone.
//!
//! These walk getter types rather than live values, so they work when an
//! intermediate value is null or no instance exists at all.

use alloc::string::String;

use mo_runtime::Type;

use super::{DescriptorProvider, TypeDescriptor};
use crate::{PathSegment, ReflectionError};

impl TypeDescriptor {
    /// Declared getter type of `segment`. Indexing into a collection yields
    /// the top type, since element types are not declared.
    fn segment_getter_type(&self, segment: &PathSegment<'_>) -> Result<Type, ReflectionError> {
        let ty = self.getter_type(segment.name())?;
        if segment.index().is_some() && Type::collection().is_assignable_from(&ty) {
            return Ok(Type::object());
        }
        Ok(ty)
    }

    /// Whether `path` is readable, following declared getter types.
    ///
    /// # Examples
    ///
    /// ```
    /// use mo_reflect::{DefaultDescriptorProvider, DescriptorProvider};
    /// use mo_runtime::{Type, TypeBuilder};
    ///
    /// let address = TypeBuilder::class("Address").property("city", Type::string()).build();
    /// let person = TypeBuilder::class("Person").property("address", address).build();
    ///
    /// let provider = DefaultDescriptorProvider::new();
    /// let desc = provider.describe(&person);
    /// assert!(desc.has_getter_path("address.city", &provider));
    /// assert!(!desc.has_getter_path("address.zip", &provider));
    /// ```
    pub fn has_getter_path(&self, path: &str, provider: &dyn DescriptorProvider) -> bool {
        let Ok(segment) = PathSegment::parse(path) else {
            return false;
        };
        let Some(children) = segment.children() else {
            return self.has_getter(segment.name());
        };
        if !self.has_getter(segment.name()) {
            return false;
        }
        match self.segment_getter_type(&segment) {
            Ok(ty) => provider.describe(&ty).has_getter_path(children, provider),
            Err(_) => false,
        }
    }

    /// Whether `path` is writable; intermediate steps must be readable.
    pub fn has_setter_path(&self, path: &str, provider: &dyn DescriptorProvider) -> bool {
        let Ok(segment) = PathSegment::parse(path) else {
            return false;
        };
        let Some(children) = segment.children() else {
            return self.has_setter(segment.name());
        };
        if !self.has_setter(segment.name()) {
            return false;
        }
        match self.getter_type(segment.name()) {
            Ok(ty) => provider.describe(&ty).has_setter_path(children, provider),
            Err(_) => false,
        }
    }

    pub fn getter_type_path(
        &self,
        path: &str,
        provider: &dyn DescriptorProvider,
    ) -> Result<Type, ReflectionError> {
        let segment = PathSegment::parse(path).map_err(|e| e.on_type(self.ty().name_arc()))?;
        match segment.children() {
            Some(children) => {
                let ty = self.segment_getter_type(&segment)?;
                provider.describe(&ty).getter_type_path(children, provider)
            }
            None => self.segment_getter_type(&segment),
        }
    }

    pub fn setter_type_path(
        &self,
        path: &str,
        provider: &dyn DescriptorProvider,
    ) -> Result<Type, ReflectionError> {
        let segment = PathSegment::parse(path).map_err(|e| e.on_type(self.ty().name_arc()))?;
        match segment.children() {
            Some(children) => {
                let ty = self.getter_type(segment.name())?;
                provider.describe(&ty).setter_type_path(children, provider)
            }
            None => self.setter_type(segment.name()),
        }
    }

    /// Canonical spelling of a dotted path.
    ///
    /// With `case_insensitive`, each step is matched ignoring case; otherwise
    /// steps must already be spelled canonically. Returns `None` as soon as a
    /// step does not resolve. Indexes are dropped from the result.
    pub fn find_property_path(
        &self,
        path: &str,
        case_insensitive: bool,
        provider: &dyn DescriptorProvider,
    ) -> Option<String> {
        let mut out = String::new();
        self.build_property_path(path, case_insensitive, provider, &mut out)?;
        Some(out)
    }

    fn build_property_path(
        &self,
        path: &str,
        case_insensitive: bool,
        provider: &dyn DescriptorProvider,
        out: &mut String,
    ) -> Option<()> {
        let segment = PathSegment::parse(path).ok()?;
        let name = self.find_property_name(segment.name())?;
        if !case_insensitive && name != segment.name() {
            return None;
        }
        out.push_str(name);

        if let Some(children) = segment.children() {
            out.push('.');
            let ty = self.getter_type(name).ok()?;
            provider
                .describe(&ty)
                .build_property_path(children, case_insensitive, provider, out)?;
        }
        Some(())
    }
}

#[cfg(test)]
mod tests {
    use mo_runtime::{Type, TypeBuilder};

    use crate::{DefaultDescriptorProvider, DescriptorProvider, ErrorKind};

    fn fixture() -> Type {
        let city = TypeBuilder::class("City").property("zipCode", Type::string()).build();
        let address = TypeBuilder::class("Address")
            .property("city", city)
            .property("lines", Type::list())
            .build();
        TypeBuilder::class("Customer")
            .property("homeAddress", address)
            .getter("readOnly", Type::int())
            .field("readOnly", Type::int())
            .build()
    }

    #[test]
    fn nested_types() {
        let provider = DefaultDescriptorProvider::new();
        let desc = provider.describe(&fixture());

        assert_eq!(
            desc.getter_type_path("homeAddress.city.zipCode", &provider).unwrap(),
            Type::string()
        );
        assert_eq!(
            desc.getter_type_path("homeAddress.lines", &provider).unwrap(),
            Type::list()
        );
        assert_eq!(
            desc.getter_type_path("homeAddress.lines[0]", &provider).unwrap(),
            Type::object()
        );
        assert_eq!(
            desc.setter_type_path("homeAddress.city", &provider).unwrap().name(),
            "City"
        );
        assert_eq!(
            desc.getter_type_path("homeAddress.nope", &provider).unwrap_err().kind(),
            ErrorKind::NotFound
        );

        let err = desc.setter_type_path("homeAddress]", &provider).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath);
        assert!(err.to_string().contains(&format!("on `{}`", desc.ty().name())), "{err}");
    }

    #[test]
    fn nested_presence() {
        let provider = DefaultDescriptorProvider::new();
        let desc = provider.describe(&fixture());

        assert!(desc.has_setter_path("homeAddress.city.zipCode", &provider));
        assert!(desc.has_getter_path("homeAddress.lines[1]", &provider));
        assert!(!desc.has_getter_path("homeAddress.lines[1].x", &provider));
        assert!(desc.has_setter_path("readOnly", &provider));
        assert!(!desc.has_getter_path("a]", &provider));
    }

    #[test]
    fn find_property_respects_case_flag() {
        let provider = DefaultDescriptorProvider::new();
        let desc = provider.describe(&fixture());

        assert_eq!(
            desc.find_property_path("HOMEADDRESS.CITY.zipcode", true, &provider).as_deref(),
            Some("homeAddress.city.zipCode")
        );
        assert_eq!(desc.find_property_path("HOMEADDRESS", false, &provider), None);
        assert_eq!(
            desc.find_property_path("homeAddress", false, &provider).as_deref(),
            Some("homeAddress")
        );
        assert_eq!(desc.find_property_path("homeAddress.missing", true, &provider), None);
    }
}
