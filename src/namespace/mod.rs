//! Namespace registry and normalization.
//!
//! Maps every legacy namespace URI of the installer vocabulary to its
//! current form and rewrites the declarations of a document accordingly.
//! After rewriting, the namespace of every element and prefixed attribute is
//! re-resolved so that later stages can key on canonical URIs alone.

use crate::diagnostics::{Diagnostics, TestType};
use crate::parser::input::NamespaceResolver;
use crate::tree::{Attribute, Document, NodeId, NodeKind};

/// The canonical core namespace.
pub const WIX_NAMESPACE: &str = "http://wixtoolset.org/schemas/v4/wxs";

/// The core namespace of the previous schema generation.
pub const LEGACY_WIX_NAMESPACE: &str = "http://schemas.microsoft.com/wix/2006/wi";

/// Legacy URI → canonical URI.
const NAMESPACE_MAP: &[(&str, &str)] = &[
    (LEGACY_WIX_NAMESPACE, WIX_NAMESPACE),
    ("http://schemas.microsoft.com/wix/BalExtension", "http://wixtoolset.org/schemas/v4/wxs/bal"),
    ("http://schemas.microsoft.com/wix/ComPlusExtension", "http://wixtoolset.org/schemas/v4/wxs/complus"),
    ("http://schemas.microsoft.com/wix/DependencyExtension", "http://wixtoolset.org/schemas/v4/wxs/dependency"),
    ("http://schemas.microsoft.com/wix/DifxAppExtension", "http://wixtoolset.org/schemas/v4/wxs/difxapp"),
    ("http://schemas.microsoft.com/wix/FirewallExtension", "http://wixtoolset.org/schemas/v4/wxs/firewall"),
    ("http://schemas.microsoft.com/wix/GamingExtension", "http://wixtoolset.org/schemas/v4/wxs/gaming"),
    ("http://schemas.microsoft.com/wix/IIsExtension", "http://wixtoolset.org/schemas/v4/wxs/iis"),
    ("http://schemas.microsoft.com/wix/MsmqExtension", "http://wixtoolset.org/schemas/v4/wxs/msmq"),
    ("http://schemas.microsoft.com/wix/NetFxExtension", "http://wixtoolset.org/schemas/v4/wxs/netfx"),
    ("http://schemas.microsoft.com/wix/PSExtension", "http://wixtoolset.org/schemas/v4/wxs/powershell"),
    ("http://schemas.microsoft.com/wix/SqlExtension", "http://wixtoolset.org/schemas/v4/wxs/sql"),
    ("http://schemas.microsoft.com/wix/TagExtension", "http://wixtoolset.org/schemas/v4/wxs/tag"),
    ("http://schemas.microsoft.com/wix/UtilExtension", "http://wixtoolset.org/schemas/v4/wxs/util"),
    ("http://schemas.microsoft.com/wix/VSExtension", "http://wixtoolset.org/schemas/v4/wxs/vs"),
    ("http://wixtoolset.org/schemas/thmutil/2010", "http://wixtoolset.org/schemas/v4/thmutil"),
    ("http://schemas.microsoft.com/wix/2009/Lux", "http://wixtoolset.org/schemas/v4/lux"),
    ("http://schemas.microsoft.com/wix/2006/localization", "http://wixtoolset.org/schemas/v4/wxl"),
    ("http://schemas.microsoft.com/wix/2006/libraries", "http://wixtoolset.org/schemas/v4/wixlib"),
    ("http://schemas.microsoft.com/wix/2006/objects", "http://wixtoolset.org/schemas/v4/wixobj"),
    ("http://schemas.microsoft.com/wix/2006/outputs", "http://wixtoolset.org/schemas/v4/wixout"),
    ("http://schemas.microsoft.com/wix/2007/pdbs", "http://wixtoolset.org/schemas/v4/wixpdb"),
    ("http://schemas.microsoft.com/wix/2003/04/actions", "http://wixtoolset.org/schemas/v4/wi/actions"),
    ("http://schemas.microsoft.com/wix/2006/tables", "http://wixtoolset.org/schemas/v4/wi/tables"),
    ("http://schemas.microsoft.com/wix/2006/WixUnit", "http://wixtoolset.org/schemas/v4/wixunit"),
];

/// Returns the canonical form of a legacy namespace URI, or `None` if the
/// URI is already canonical or unknown.
///
/// # Examples
///
/// ```
/// use wixcop::namespace::{canonical_uri, WIX_NAMESPACE};
///
/// assert_eq!(
///     canonical_uri("http://schemas.microsoft.com/wix/UtilExtension"),
///     Some("http://wixtoolset.org/schemas/v4/wxs/util")
/// );
/// assert_eq!(canonical_uri(WIX_NAMESPACE), None);
/// ```
#[must_use]
pub fn canonical_uri(uri: &str) -> Option<&'static str> {
    NAMESPACE_MAP
        .iter()
        .find(|(legacy, _)| *legacy == uri)
        .map(|&(_, canonical)| canonical)
}

/// Rewrites legacy namespace declarations to their canonical URIs and
/// supplies the core namespace to a root element that has none.
///
/// Declarations inside pass-through elements are left alone. Returns the
/// number of diagnostics recorded.
pub fn normalize(doc: &mut Document, diagnostics: &mut Diagnostics<'_>) -> usize {
    let before = diagnostics.count();
    let settings = diagnostics.settings();
    let elements = doc.elements_in_order(|d, id| {
        d.node_name(id).is_some_and(|n| settings.is_pass_through(n))
    });

    if let Some(&root) = elements.first() {
        if Some(root) == doc.root_element()
            && doc.node_prefix(root).is_none()
            && doc.node_namespace(root).is_none()
            && diagnostics.report(
                TestType::XmlnsMissing,
                doc.location(root),
                format!("The xmlns attribute is missing. It must be present with a value of '{WIX_NAMESPACE}'."),
            )
        {
            // an explicit `xmlns=""` is overwritten in place
            match doc.attribute_index(root, "xmlns") {
                Some(index) => {
                    if let Some(attributes) = doc.attributes_mut(root) {
                        WIX_NAMESPACE.clone_into(&mut attributes[index].value);
                    }
                }
                None => doc.insert_attribute(root, 0, Attribute::new("xmlns", WIX_NAMESPACE)),
            }
        }
    }

    for id in elements {
        let location = doc.location(id);
        let changes: Vec<(usize, &'static str)> = doc
            .attributes(id)
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_namespace_declaration())
            .filter_map(|(i, a)| canonical_uri(&a.value).map(|uri| (i, uri)))
            .collect();

        for (index, canonical) in changes {
            let old = doc.attributes(id)[index].value.clone();
            let reported = diagnostics.report(
                TestType::NamespaceChanged,
                location,
                format!("The namespace '{old}' is out of date. It must be '{canonical}'."),
            );
            if reported {
                if let Some(attributes) = doc.attributes_mut(id) {
                    canonical.clone_into(&mut attributes[index].value);
                }
            }
        }
    }

    let root = doc.root();
    let mut resolver = NamespaceResolver::new();
    for child in doc.children(root).collect::<Vec<_>>() {
        rebind(doc, child, &mut resolver);
    }

    diagnostics.count() - before
}

/// Re-resolves the namespace of `id` and its descendants from the
/// declarations now in the tree.
fn rebind(doc: &mut Document, id: NodeId, resolver: &mut NamespaceResolver) {
    if !doc.node(id).kind.is_element() {
        return;
    }

    resolver.push_scope();
    for attr in doc.attributes(id) {
        if attr.is_namespace_declaration() {
            resolver.bind(attr.declared_prefix().map(String::from), attr.value.clone());
        }
    }

    let element_ns = resolver.resolve(doc.node_prefix(id)).map(String::from);
    doc.set_node_namespace(id, element_ns);
    if let NodeKind::Element { attributes, .. } = &mut doc.node_mut(id).kind {
        for attr in attributes.iter_mut() {
            if let Some(prefix) = attr.prefix.as_deref() {
                if prefix != "xmlns" {
                    attr.namespace = resolver.resolve(Some(prefix)).map(String::from);
                }
            }
        }
    }

    let children: Vec<NodeId> = doc.children(id).collect();
    for child in children {
        rebind(doc, child, resolver);
    }
    resolver.pop_scope();
}
