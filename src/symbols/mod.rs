//! Program symbol model consumed by the analysis core.
//!
//! The engine never walks a concrete program representation itself; a front end (source
//! semantic trees or a loaded binary module) lowers its declarations into this model and
//! hands the engine typed handles. The seam between the two is the [`SymbolStore`] trait:
//! the core is generic over it, so each front end can supply its own backing store.
//! [`SymbolTable`] is the batteries-included in-memory implementation.
//!
//! Handles ([`TypeId`], [`MethodId`], [`FieldId`], [`PropertyId`], [`GenericParamId`])
//! are only meaningful against the store they were created from.

use crate::capability::MemberCapabilities;

/// Opaque source location handle attached to diagnostics.
///
/// The core never interprets this value; front ends mint it and map it back to real
/// positions when rendering diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Location(pub u64);

macro_rules! symbol_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $name {
            /// Returns the raw index of this handle.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

symbol_id! {
    /// Handle to a type declaration.
    TypeId
}
symbol_id! {
    /// Handle to a method declaration.
    MethodId
}
symbol_id! {
    /// Handle to a field declaration.
    FieldId
}
symbol_id! {
    /// Handle to a property declaration.
    PropertyId
}
symbol_id! {
    /// Handle to a generic parameter declaration.
    GenericParamId
}

/// Declared type of a value slot (parameter, return, field, property), reduced to what
/// the analysis needs: whether the slot can carry a reflection target, and the type name
/// used for structural intrinsic matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotType {
    /// A reflection-capable type handle (`System.Type` or a derived type)
    TypeHandle,
    /// Text that can name a type (`System.String`)
    Text,
    /// Nothing is returned (`System.Void`)
    Void,
    /// Any other type, identified by its full name
    Other(String),
}

impl SlotType {
    /// The full type name used for structural signature matching.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            SlotType::TypeHandle => "System.Type",
            SlotType::Text => "System.String",
            SlotType::Void => "System.Void",
            SlotType::Other(name) => name,
        }
    }

    /// Returns `true` if a capability annotation is a legal placement on this slot.
    ///
    /// Annotations are only meaningful on values that can carry a reflection target:
    /// type handles and type-naming strings.
    #[must_use]
    pub fn is_type_like(&self) -> bool {
        matches!(self, SlotType::TypeHandle | SlotType::Text)
    }
}

/// Distinguishes ordinary methods from property accessors.
///
/// Accessor kinds drive the annotation precedence rules: an unannotated getter return
/// slot or setter value parameter falls back to the associated property's annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// A plain method or constructor
    Ordinary,
    /// The `get` accessor of the referenced property
    PropertyGet(PropertyId),
    /// The `set` accessor of the referenced property
    PropertySet(PropertyId),
}

/// A formal parameter declaration.
#[derive(Debug, Clone)]
pub struct ParamDecl {
    /// Parameter name, for diagnostics
    pub name: String,
    /// Declared type of the parameter
    pub ty: SlotType,
    /// Capability annotation attached directly to this parameter (empty = unannotated)
    pub annotation: MemberCapabilities,
    /// Source location of the parameter declaration
    pub location: Location,
}

/// A type declaration.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    /// Namespace, empty for the global namespace
    pub namespace: String,
    /// Simple name, including any generic arity suffix (`` Nullable`1 ``)
    pub name: String,
    /// Whether this is a value type (affects implicit-receiver conventions)
    pub is_value_type: bool,
    /// Whether values of this type can carry a reflection target
    pub is_type_like: bool,
    /// Generic parameters declared on the type, in order
    pub generic_params: Vec<GenericParamId>,
    /// Source location of the type declaration
    pub location: Location,
}

impl TypeDecl {
    /// The namespace-qualified name of this type.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Returns `true` if this is the nullable wrapper type (`` System.Nullable`1 ``).
    #[must_use]
    pub fn is_nullable_wrapper(&self) -> bool {
        self.namespace == "System" && self.name == "Nullable`1"
    }
}

/// A method declaration.
#[derive(Debug, Clone)]
pub struct MethodDecl {
    /// Method name, for diagnostics and intrinsic matching
    pub name: String,
    /// Declaring type
    pub owner: TypeId,
    /// Whether the method is static (no implicit receiver)
    pub is_static: bool,
    /// Ordinary method or property accessor
    pub kind: MethodKind,
    /// Formal parameters, excluding the implicit receiver
    pub params: Vec<ParamDecl>,
    /// Generic parameters declared on the method, in order
    pub generic_params: Vec<GenericParamId>,
    /// Declared return type
    pub return_ty: SlotType,
    /// Capability annotation on the return slot (empty = unannotated)
    pub return_annotation: MemberCapabilities,
    /// Capability annotation on the method itself, which applies to the implicit receiver
    pub receiver_annotation: MemberCapabilities,
    /// Whether the enclosing symbol is exempt from dataflow analysis
    pub suppressed: bool,
    /// Whether the declaration is source-editable (drives suggested-fix metadata)
    pub in_source: bool,
    /// Source location of the method declaration
    pub location: Location,
}

/// A field declaration.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Field name, for diagnostics
    pub name: String,
    /// Declaring type
    pub owner: TypeId,
    /// Declared field type
    pub ty: SlotType,
    /// Capability annotation on the field (empty = unannotated)
    pub annotation: MemberCapabilities,
    /// Source location of the field declaration
    pub location: Location,
}

/// A property declaration.
///
/// Accessor methods are separate [`MethodDecl`] entries that point back here through
/// their [`MethodKind`].
#[derive(Debug, Clone)]
pub struct PropertyDecl {
    /// Property name, for diagnostics
    pub name: String,
    /// Declaring type
    pub owner: TypeId,
    /// Declared property type
    pub ty: SlotType,
    /// Capability annotation on the property itself (empty = unannotated)
    pub annotation: MemberCapabilities,
    /// The `get` accessor, if any
    pub getter: Option<MethodId>,
    /// The `set` accessor, if any
    pub setter: Option<MethodId>,
    /// Source location of the property declaration
    pub location: Location,
}

/// A generic parameter declaration on a type or method.
#[derive(Debug, Clone)]
pub struct GenericParamDecl {
    /// Generic parameter name, for diagnostics
    pub name: String,
    /// Capability annotation attached to the generic parameter (empty = unannotated)
    pub annotation: MemberCapabilities,
    /// Whether the declaration is source-editable (drives suggested-fix metadata)
    pub in_source: bool,
    /// Source location of the generic parameter declaration
    pub location: Location,
}

/// Read access to program declarations.
///
/// This is the seam between the analysis core and its front ends. The core only ever
/// queries identity, annotations, and signature shape; how the declarations are stored
/// is the front end's business. The direct accessors require handles that originate
/// from this store and may panic on foreign ones; the `has_*` queries are the checked
/// form, and the engine uses them to reject bodies carrying unresolvable handles.
pub trait SymbolStore {
    /// Resolves a type handle.
    fn type_decl(&self, id: TypeId) -> &TypeDecl;
    /// Resolves a method handle.
    fn method(&self, id: MethodId) -> &MethodDecl;
    /// Resolves a field handle.
    fn field(&self, id: FieldId) -> &FieldDecl;
    /// Resolves a property handle.
    fn property(&self, id: PropertyId) -> &PropertyDecl;
    /// Resolves a generic parameter handle.
    fn generic_param(&self, id: GenericParamId) -> &GenericParamDecl;

    /// Returns `true` if a type handle resolves in this store.
    fn has_type(&self, id: TypeId) -> bool;
    /// Returns `true` if a method handle resolves in this store.
    fn has_method(&self, id: MethodId) -> bool;
    /// Returns `true` if a field handle resolves in this store.
    fn has_field(&self, id: FieldId) -> bool;
    /// Returns `true` if a property handle resolves in this store.
    fn has_property(&self, id: PropertyId) -> bool;
    /// Returns `true` if a generic parameter handle resolves in this store.
    fn has_generic_param(&self, id: GenericParamId) -> bool;

    /// All method handles in the store, for whole-program validation passes.
    fn method_ids(&self) -> Vec<MethodId>;
    /// All field handles in the store.
    fn field_ids(&self) -> Vec<FieldId>;
    /// All property handles in the store.
    fn property_ids(&self) -> Vec<PropertyId>;

    /// Display name of a method, `Namespace.Type.Name`.
    fn method_display(&self, id: MethodId) -> String {
        let method = self.method(id);
        format!("{}.{}", self.type_decl(method.owner).full_name(), method.name)
    }

    /// Display name of a field, `Namespace.Type.Name`.
    fn field_display(&self, id: FieldId) -> String {
        let field = self.field(id);
        format!("{}.{}", self.type_decl(field.owner).full_name(), field.name)
    }

    /// Display name of a property, `Namespace.Type.Name`.
    fn property_display(&self, id: PropertyId) -> String {
        let property = self.property(id);
        format!(
            "{}.{}",
            self.type_decl(property.owner).full_name(),
            property.name
        )
    }
}

/// In-memory [`SymbolStore`] backed by typed arenas.
///
/// Front ends populate the table with `add_*` calls, each returning the handle for the
/// inserted declaration. The table is append-only; declarations are immutable once
/// inserted, which keeps concurrent analysis over the same table safe.
#[derive(Debug, Default)]
pub struct SymbolTable {
    types: Vec<TypeDecl>,
    methods: Vec<MethodDecl>,
    fields: Vec<FieldDecl>,
    properties: Vec<PropertyDecl>,
    generic_params: Vec<GenericParamDecl>,
}

impl SymbolTable {
    /// Creates an empty symbol table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a type declaration and returns its handle.
    pub fn add_type(&mut self, decl: TypeDecl) -> TypeId {
        self.types.push(decl);
        TypeId(u32::try_from(self.types.len() - 1).expect("symbol table overflow"))
    }

    /// Inserts a method declaration and returns its handle.
    pub fn add_method(&mut self, decl: MethodDecl) -> MethodId {
        self.methods.push(decl);
        MethodId(u32::try_from(self.methods.len() - 1).expect("symbol table overflow"))
    }

    /// Inserts a field declaration and returns its handle.
    pub fn add_field(&mut self, decl: FieldDecl) -> FieldId {
        self.fields.push(decl);
        FieldId(u32::try_from(self.fields.len() - 1).expect("symbol table overflow"))
    }

    /// Inserts a property declaration and returns its handle.
    pub fn add_property(&mut self, decl: PropertyDecl) -> PropertyId {
        self.properties.push(decl);
        PropertyId(u32::try_from(self.properties.len() - 1).expect("symbol table overflow"))
    }

    /// Inserts a generic parameter declaration and returns its handle.
    pub fn add_generic_param(&mut self, decl: GenericParamDecl) -> GenericParamId {
        self.generic_params.push(decl);
        GenericParamId(u32::try_from(self.generic_params.len() - 1).expect("symbol table overflow"))
    }

    /// Links a property to its accessors after all three have been inserted.
    ///
    /// The accessor methods must already carry the matching [`MethodKind`].
    pub fn link_property(
        &mut self,
        property: PropertyId,
        getter: Option<MethodId>,
        setter: Option<MethodId>,
    ) {
        let decl = &mut self.properties[property.index()];
        decl.getter = getter;
        decl.setter = setter;
    }
}

impl SymbolStore for SymbolTable {
    fn type_decl(&self, id: TypeId) -> &TypeDecl {
        &self.types[id.index()]
    }

    fn method(&self, id: MethodId) -> &MethodDecl {
        &self.methods[id.index()]
    }

    fn field(&self, id: FieldId) -> &FieldDecl {
        &self.fields[id.index()]
    }

    fn property(&self, id: PropertyId) -> &PropertyDecl {
        &self.properties[id.index()]
    }

    fn generic_param(&self, id: GenericParamId) -> &GenericParamDecl {
        &self.generic_params[id.index()]
    }

    fn has_type(&self, id: TypeId) -> bool {
        id.index() < self.types.len()
    }

    fn has_method(&self, id: MethodId) -> bool {
        id.index() < self.methods.len()
    }

    fn has_field(&self, id: FieldId) -> bool {
        id.index() < self.fields.len()
    }

    fn has_property(&self, id: PropertyId) -> bool {
        id.index() < self.properties.len()
    }

    fn has_generic_param(&self, id: GenericParamId) -> bool {
        id.index() < self.generic_params.len()
    }

    fn method_ids(&self) -> Vec<MethodId> {
        (0..self.methods.len() as u32).map(MethodId).collect()
    }

    fn field_ids(&self) -> Vec<FieldId> {
        (0..self.fields.len() as u32).map(FieldId).collect()
    }

    fn property_ids(&self) -> Vec<PropertyId> {
        (0..self.properties.len() as u32).map(PropertyId).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_type(name: &str) -> TypeDecl {
        TypeDecl {
            namespace: "System".to_string(),
            name: name.to_string(),
            is_value_type: false,
            is_type_like: false,
            generic_params: Vec::new(),
            location: Location::default(),
        }
    }

    #[test]
    fn test_full_name_and_nullable_detection() {
        let ty = sample_type("Nullable`1");
        assert_eq!(ty.full_name(), "System.Nullable`1");
        assert!(ty.is_nullable_wrapper());
        assert!(!sample_type("Type").is_nullable_wrapper());
    }

    #[test]
    fn test_table_roundtrip() {
        let mut table = SymbolTable::new();
        let ty = table.add_type(sample_type("Object"));
        let field = table.add_field(FieldDecl {
            name: "_cached".to_string(),
            owner: ty,
            ty: SlotType::TypeHandle,
            annotation: MemberCapabilities::PUBLIC_FIELDS,
            location: Location(7),
        });

        assert_eq!(table.type_decl(ty).name, "Object");
        assert_eq!(table.field(field).annotation, MemberCapabilities::PUBLIC_FIELDS);
        assert_eq!(table.field_display(field), "System.Object._cached");
        assert_eq!(table.field_ids(), vec![field]);

        assert!(table.has_type(ty) && table.has_field(field));
        assert!(!table.has_field(FieldId(99)));
        assert!(!table.has_method(MethodId(0)));
    }

    #[test]
    fn test_slot_type_names() {
        assert_eq!(SlotType::TypeHandle.type_name(), "System.Type");
        assert_eq!(SlotType::Other("System.Int32".to_string()).type_name(), "System.Int32");
        assert!(SlotType::Text.is_type_like());
        assert!(!SlotType::Void.is_type_like());
    }
}
