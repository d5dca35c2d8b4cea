//! Field mapping between standard and vendor-specific names.

use std::{borrow::Cow, collections::HashMap};

use serde_json::{Map, Value};

use super::{
    config::FieldMappingConfig,
    traits::{FieldMapper, RequestData, ResponseFields},
    wire::insert_path,
};

/// Field mapper built from a [`FieldMappingConfig`].
#[derive(Debug, Clone, Default)]
pub struct ConfigurableFieldMapper {
    request_mappings: HashMap<String, String>,
    response_mappings: HashMap<String, String>,
    pass_through_unmapped: bool,
}

impl ConfigurableFieldMapper {
    /// Creates a new configurable field mapper.
    #[must_use]
    pub fn new(config: &FieldMappingConfig) -> Self {
        Self {
            request_mappings: config.request.clone(),
            response_mappings: config.response.clone(),
            pass_through_unmapped: config.pass_through_unmapped,
        }
    }

    /// Writes the standard fields of `request` into `body` at their vendor
    /// paths.
    ///
    /// Unmapped fields are skipped unless the mapper passes them through.
    pub fn write_request(&self, request: &RequestData, body: &mut Map<String, Value>) {
        for (name, value) in request.fields() {
            if !self.pass_through_unmapped && !self.is_request_mapped(name) {
                continue;
            }
            insert_path(body, &self.map_request_field(name), Value::String(value.clone()));
        }
    }

    /// Renames the top-level keys of a parsed reply to their standard names.
    #[must_use]
    pub fn rename_response(&self, fields: ResponseFields) -> ResponseFields {
        if self.response_mappings.is_empty() {
            return fields;
        }
        fields
            .into_iter()
            .map(|(key, value)| (self.map_response_field(&key).into_owned(), value))
            .collect()
    }
}

impl FieldMapper for ConfigurableFieldMapper {
    fn map_request_field<'a>(&self, standard_name: &'a str) -> Cow<'a, str> {
        self.request_mappings
            .get(standard_name)
            .map_or_else(|| Cow::Borrowed(standard_name), |s| Cow::Owned(s.clone()))
    }

    fn map_response_field<'a>(&self, vendor_name: &'a str) -> Cow<'a, str> {
        self.response_mappings
            .get(vendor_name)
            .map_or_else(|| Cow::Borrowed(vendor_name), |s| Cow::Owned(s.clone()))
    }

    fn is_request_mapped(&self, standard_name: &str) -> bool {
        self.request_mappings.contains_key(standard_name)
    }

    fn has_custom_mappings(&self) -> bool {
        !self.request_mappings.is_empty() || !self.response_mappings.is_empty()
    }
}
