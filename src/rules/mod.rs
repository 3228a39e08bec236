//! Table-driven attribute migrations.
//!
//! Each [`Rule`] names the elements it applies to (local names in the
//! canonical core namespace) and a [`Transform`] carrying plain function
//! pointers. [`apply`] walks the tree once in document order after namespace
//! normalization. Every change is reported before it is made, so a rule
//! suppressed by the settings overlay leaves the element untouched.

use crate::diagnostics::{Diagnostics, TestType};
use crate::namespace::WIX_NAMESPACE;
use crate::tree::{Attribute, Document, NodeId};

/// What a rule does to an element's attributes.
#[derive(Debug, Clone, Copy)]
pub enum Transform {
    /// Renames `from` to `to` in place, keeping the value.
    Rename {
        /// The legacy attribute name.
        from: &'static str,
        /// The current attribute name.
        to: &'static str,
    },
    /// Replaces `from` with `to`, deriving the new value from the old one.
    ///
    /// `compute` returns `None` for a value outside its domain,
    /// `Some(None)` when the new value equals the new default (the attribute
    /// is then dropped), and `Some(Some(v))` otherwise.
    Recompute {
        /// The legacy attribute name.
        from: &'static str,
        /// The current attribute name.
        to: &'static str,
        /// Maps the legacy value to the current one.
        compute: fn(&str) -> Option<Option<&'static str>>,
    },
    /// Drops `attribute` when its value is `default`.
    RemoveIfDefault {
        /// The attribute to check.
        attribute: &'static str,
        /// The value that is now implied.
        default: &'static str,
    },
    /// Adds `attribute` at the front when it is missing, derived from the
    /// value of `source`.
    SynthesizeIfAbsent {
        /// The attribute to add.
        attribute: &'static str,
        /// The attribute it is derived from.
        source: &'static str,
        /// Derives the new value, or `None` if it cannot.
        derive: fn(&str) -> Option<String>,
    },
}

/// One migration rule.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// The id reported when the rule fires.
    pub test: TestType,
    /// Local names of the core-namespace elements the rule applies to.
    pub elements: &'static [&'static str],
    /// The change the rule makes.
    pub transform: Transform,
}

const SIGNED_PACKAGES: &[&str] = &["ExePackage", "MsiPackage", "MspPackage", "MsuPackage", "Payload"];

/// The migration table, in the order rules are attempted on an element.
pub static RULES: &[Rule] = &[
    Rule {
        test: TestType::SuppressSignatureValidationDeprecated,
        elements: SIGNED_PACKAGES,
        transform: Transform::Recompute {
            from: "SuppressSignatureValidation",
            to: "EnableSignatureValidation",
            compute: invert_suppress,
        },
    },
    Rule {
        test: TestType::AssignAnonymousFileId,
        elements: &["File"],
        transform: Transform::SynthesizeIfAbsent {
            attribute: "Id",
            source: "Source",
            derive: file_name_of,
        },
    },
    Rule {
        test: TestType::AutoGuidUnnecessary,
        elements: &["Component"],
        transform: Transform::RemoveIfDefault {
            attribute: "Guid",
            default: "*",
        },
    },
    Rule {
        test: TestType::BinaryKeyRenamed,
        elements: &["CustomAction"],
        transform: Transform::Rename {
            from: "BinaryKey",
            to: "BinaryRef",
        },
    },
    Rule {
        test: TestType::FileKeyRenamed,
        elements: &["CustomAction"],
        transform: Transform::Rename {
            from: "FileKey",
            to: "FileRef",
        },
    },
    Rule {
        test: TestType::ExePackageCommandRenamed,
        elements: &["ExePackage"],
        transform: Transform::Rename {
            from: "InstallCommand",
            to: "InstallArguments",
        },
    },
    Rule {
        test: TestType::ExePackageCommandRenamed,
        elements: &["ExePackage"],
        transform: Transform::Rename {
            from: "RepairCommand",
            to: "RepairArguments",
        },
    },
    Rule {
        test: TestType::ExePackageCommandRenamed,
        elements: &["ExePackage"],
        transform: Transform::Rename {
            from: "UninstallCommand",
            to: "UninstallArguments",
        },
    },
    Rule {
        test: TestType::Win64AttributeReplaced,
        elements: &["Component", "CustomAction", "RegistrySearch"],
        transform: Transform::Recompute {
            from: "Win64",
            to: "Bitness",
            compute: win64_to_bitness,
        },
    },
    Rule {
        test: TestType::FeatureAbsentReplaced,
        elements: &["Feature"],
        transform: Transform::Recompute {
            from: "Absent",
            to: "AllowAbsent",
            compute: absent_to_allow_absent,
        },
    },
];

/// `SuppressSignatureValidation` → `EnableSignatureValidation`, default `no`.
fn invert_suppress(value: &str) -> Option<Option<&'static str>> {
    match value {
        "no" => Some(Some("yes")),
        "yes" => Some(None),
        _ => None,
    }
}

fn win64_to_bitness(value: &str) -> Option<Option<&'static str>> {
    match value {
        "yes" => Some(Some("always64")),
        "no" => Some(Some("always32")),
        _ => None,
    }
}

/// `Absent` → `AllowAbsent`, default `yes`.
fn absent_to_allow_absent(value: &str) -> Option<Option<&'static str>> {
    match value {
        "allow" => Some(None),
        "disallow" => Some(Some("no")),
        _ => None,
    }
}

/// The final segment of a Windows or POSIX path.
fn file_name_of(source: &str) -> Option<String> {
    source
        .rsplit(['\\', '/'])
        .next()
        .filter(|name| !name.is_empty())
        .map(String::from)
}

/// Applies [`RULES`] to every core-namespace element outside pass-through
/// subtrees. Returns the number of diagnostics recorded.
pub fn apply(doc: &mut Document, diagnostics: &mut Diagnostics<'_>) -> usize {
    let before = diagnostics.count();
    let settings = diagnostics.settings();
    let elements = doc.elements_in_order(|d, id| {
        d.node_name(id).is_some_and(|n| settings.is_pass_through(n))
    });

    for id in elements {
        if doc.node_namespace(id) != Some(WIX_NAMESPACE) {
            continue;
        }
        let Some(name) = doc.node_name(id).map(String::from) else {
            continue;
        };
        for rule in RULES.iter().filter(|r| r.elements.contains(&name.as_str())) {
            apply_rule(doc, id, &name, rule, diagnostics);
        }
    }

    diagnostics.count() - before
}

fn apply_rule(
    doc: &mut Document,
    id: NodeId,
    element: &str,
    rule: &Rule,
    diagnostics: &mut Diagnostics<'_>,
) {
    let location = doc.location(id);
    match rule.transform {
        Transform::Rename { from, to } => {
            let Some(index) = doc.attribute_index(id, from) else {
                return;
            };
            if doc.attribute(id, to).is_some() {
                conflict(diagnostics, doc, id, element, from, to);
                return;
            }
            let message = format!("The {element}/@{from} attribute has been renamed {to}.");
            if diagnostics.report(rule.test, location, message) {
                if let Some(attributes) = doc.attributes_mut(id) {
                    to.clone_into(&mut attributes[index].name);
                }
            }
        }
        Transform::Recompute { from, to, compute } => {
            let Some(index) = doc.attribute_index(id, from) else {
                return;
            };
            let value = doc.attributes(id)[index].value.clone();
            let Some(result) = compute(&value) else {
                diagnostics.report(
                    TestType::RuleApplicationError,
                    location,
                    format!("The {element}/@{from} value '{value}' cannot be converted to {to}."),
                );
                return;
            };
            if doc.attribute(id, to).is_some() {
                conflict(diagnostics, doc, id, element, from, to);
                return;
            }
            let message = match result {
                Some(new) => format!(
                    "The {element}/@{from} attribute has been replaced by {to}. Use {to}=\"{new}\" instead."
                ),
                None => format!(
                    "The {element}/@{from} attribute has been replaced by {to}, whose default matches '{value}'. Remove it."
                ),
            };
            if !diagnostics.report(rule.test, location, message) {
                return;
            }
            match result {
                Some(new) => {
                    if let Some(attributes) = doc.attributes_mut(id) {
                        attributes[index] = Attribute::new(to, new);
                    }
                }
                None => {
                    doc.remove_attribute(id, from);
                }
            }
        }
        Transform::RemoveIfDefault { attribute, default } => {
            if doc.attribute(id, attribute) != Some(default) {
                return;
            }
            let message = format!(
                "The {element}/@{attribute} value '{default}' is now the default. Remove the attribute."
            );
            if diagnostics.report(rule.test, location, message) {
                doc.remove_attribute(id, attribute);
            }
        }
        Transform::SynthesizeIfAbsent {
            attribute,
            source,
            derive,
        } => {
            if doc.attribute(id, attribute).is_some() {
                return;
            }
            let Some(value) = doc.attribute(id, source).and_then(derive) else {
                diagnostics.report(
                    TestType::RuleApplicationError,
                    location,
                    format!("The {element}/@{attribute} attribute is missing and cannot be derived from {source}."),
                );
                return;
            };
            let message = format!(
                "The {element}/@{attribute} attribute must be specified. Using '{value}' from {source}."
            );
            if diagnostics.report(rule.test, location, message) {
                doc.insert_attribute(id, 0, Attribute::new(attribute, value));
            }
        }
    }
}

fn conflict(
    diagnostics: &mut Diagnostics<'_>,
    doc: &Document,
    id: NodeId,
    element: &str,
    from: &str,
    to: &str,
) {
    diagnostics.report(
        TestType::RuleApplicationError,
        doc.location(id),
        format!("The {element} element has both {from} and {to}. Remove {from}."),
    );
}
