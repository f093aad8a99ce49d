use crate::diag::Coord;

/// A naming and containment rule for one object class
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaBinding {
    pub binding_name: String,
    /// The object class being bound, as referenced
    pub ldap_name: String,
    /// The object class entries of [`Self::ldap_name`] can be created under
    pub allowable_parent: String,
    /// The attribute used as the relative distinguished name
    pub named_by: String,
    pub origin: Option<Coord>,
}
