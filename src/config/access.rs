use super::*;
use crate::path;

impl RuleTable {
    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Arity declared for `name`, if the table names it.
    pub fn arity_of(&self, name: &str) -> Option<&Arity> {
        self.rules.iter().find(|r| r.name == name).map(|r| &r.arity)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.arity_of(name).is_some()
    }

    /// Names of all singleton-classified fields, in declaration order.
    pub fn singleton_names(&self) -> Vec<&str> {
        self.rules
            .iter()
            .filter(|r| r.arity == Arity::Singleton)
            .map(|r| r.name.as_str())
            .collect()
    }

    /// Rewrite an attribute path written against the repeated-block shape
    /// using this table's singleton fields.
    ///
    /// # Examples
    /// ```
    /// use hcl_reshape::RuleTable;
    ///
    /// let rules = RuleTable::advanced_cluster();
    /// assert_eq!(
    ///     rules.rewrite_path("replication_specs.0.region_configs.0.electable_specs.0.disk_size_gb"),
    ///     "replication_specs.0.region_configs.0.electable_specs.disk_size_gb"
    /// );
    /// ```
    pub fn rewrite_path(&self, attr_path: &str) -> String {
        path::rewrite_path(attr_path, &self.singleton_names())
    }
}
