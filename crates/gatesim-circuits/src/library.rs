use std::collections::BTreeMap;

use crate::{template::DEFAULT_MAX_DEPTH, GateDescriptor, GateType, Template, TemplateError};

/// A gate descriptor resolved against a [`TemplateLibrary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<'a> {
    /// A built-in gate.
    Builtin(GateType),
    /// A nested template.
    Custom(&'a Template),
}

/// A collection of named templates.
///
/// Templates in a library may nest each other by name. A template is validated
/// against the library when it is inserted, and cannot be removed while another
/// template still nests it. A deserialized library is validated as a whole.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "UncheckedLibrary")
)]
pub struct TemplateLibrary {
    pub(crate) templates: BTreeMap<String, Template>,
    pub(crate) max_depth: usize,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct UncheckedLibrary {
    templates: BTreeMap<String, Template>,
    max_depth: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<UncheckedLibrary> for TemplateLibrary {
    type Error = TemplateError;

    fn try_from(unchecked: UncheckedLibrary) -> Result<Self, Self::Error> {
        let library = TemplateLibrary {
            templates: unchecked.templates,
            max_depth: unchecked.max_depth,
        };

        for (name, template) in &library.templates {
            if name != template.name() {
                return Err(TemplateError::InvalidCircuitDescriptor(name.clone()));
            }
            if name.parse::<GateType>().is_ok() {
                return Err(TemplateError::ReservedName(name.clone()));
            }

            template.validate(&library, library.max_depth)?;
        }

        Ok(library)
    }
}

impl Default for TemplateLibrary {
    fn default() -> Self {
        Self {
            templates: BTreeMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl TemplateLibrary {
    /// Creates a new, empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the nesting limit enforced on insertion.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Returns the nesting limit enforced on insertion.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Validates and inserts a template.
    pub fn insert(&mut self, template: Template) -> Result<(), TemplateError> {
        if template.name().parse::<GateType>().is_ok() {
            return Err(TemplateError::ReservedName(template.name.clone()));
        }

        if self.templates.contains_key(template.name()) {
            return Err(TemplateError::DuplicateTemplate(template.name.clone()));
        }

        template.validate(self, self.max_depth)?;
        self.templates.insert(template.name.clone(), template);

        Ok(())
    }

    /// Returns the template with the given name.
    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    /// Returns `true` if the library holds a template with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Removes a template which no other template nests.
    pub fn remove(&mut self, name: &str) -> Result<Template, TemplateError> {
        if let Some(user) = self
            .templates
            .values()
            .find(|template| template.dependencies().any(|dep| dep == name))
        {
            return Err(TemplateError::TemplateInUse {
                name: name.to_string(),
                user: user.name.clone(),
            });
        }

        self.templates
            .remove(name)
            .ok_or_else(|| TemplateError::InvalidCircuitDescriptor(name.to_string()))
    }

    /// Returns an iterator over the templates, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &Template> + '_ {
        self.templates.values()
    }

    /// Returns the number of templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns `true` if the library is empty.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Resolves a gate descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidCircuitDescriptor`] if the name is neither a
    /// built-in gate nor a template in the library.
    pub fn resolve(&self, gate: &GateDescriptor) -> Result<Resolved<'_>, TemplateError> {
        if let Some(ty) = gate.gate_type() {
            return Ok(Resolved::Builtin(ty));
        }

        self.templates
            .get(&gate.name)
            .map(Resolved::Custom)
            .ok_or_else(|| TemplateError::InvalidCircuitDescriptor(gate.name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use crate::TemplateBuilder;

    use super::*;

    fn half_adder(library: &TemplateLibrary) -> Template {
        let mut builder = TemplateBuilder::new("HALF_ADDER");

        let xor = builder.add_gate(GateType::Xor);
        let and = builder.add_gate(GateType::And);
        let a = builder.add_gate(GateType::Buffer);
        let b = builder.add_gate(GateType::Buffer);

        builder.connect(a.output(0), xor.input(0));
        builder.connect(a.output(0), and.input(0));
        builder.connect(b.output(0), xor.input(1));
        builder.connect(b.output(0), and.input(1));

        builder.build(library).unwrap()
    }

    #[test]
    fn test_insert_and_resolve() {
        let mut library = TemplateLibrary::new();
        let template = half_adder(&library);
        library.insert(template.clone()).unwrap();

        assert_eq!(
            library.resolve(&GateDescriptor::custom("HALF_ADDER")),
            Ok(Resolved::Custom(&template))
        );
        assert_eq!(
            library.resolve(&GateDescriptor::builtin(GateType::Nor)),
            Ok(Resolved::Builtin(GateType::Nor))
        );
        assert_eq!(
            library.resolve(&GateDescriptor::custom("FULL_ADDER")),
            Err(TemplateError::InvalidCircuitDescriptor(
                "FULL_ADDER".to_string()
            ))
        );
    }

    #[test]
    fn test_reserved_and_duplicate_names() {
        let mut library = TemplateLibrary::new();
        let template = half_adder(&library);
        library.insert(template.clone()).unwrap();

        assert_eq!(
            library.insert(template),
            Err(TemplateError::DuplicateTemplate("HALF_ADDER".to_string()))
        );

        let mut builder = TemplateBuilder::new("xor");
        builder.add_gate(GateType::Xor);
        let reserved = builder.build(&library).unwrap();

        assert_eq!(
            library.insert(reserved),
            Err(TemplateError::ReservedName("xor".to_string()))
        );
    }

    #[test]
    fn test_remove_refuses_template_in_use() {
        let mut library = TemplateLibrary::new();
        library.insert(half_adder(&library)).unwrap();

        let mut builder = TemplateBuilder::new("WRAPPER");
        builder.add_custom("HALF_ADDER");
        library.insert(builder.build(&library).unwrap()).unwrap();

        assert_eq!(
            library.remove("HALF_ADDER"),
            Err(TemplateError::TemplateInUse {
                name: "HALF_ADDER".to_string(),
                user: "WRAPPER".to_string()
            })
        );

        library.remove("WRAPPER").unwrap();
        library.remove("HALF_ADDER").unwrap();
        assert!(library.is_empty());
    }
}
