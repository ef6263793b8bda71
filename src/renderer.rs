//! Schema-to-document-tree renderer.
//!
//! [`SchemaRenderer::render_schema`] turns a loaded schema into the full page
//! tree: title, description, outline, the schema definition proper, examples,
//! internal definitions and the original source. The schema walk dispatches on
//! the first of: a combiner (`anyOf`/`allOf`/`oneOf`), `properties`, `type`,
//! `$ref`, `tag`; a node with none of these is rendered as unrestricted.

use log::warn;
use serde_yaml::Value;

use crate::nodes::{DocNode, NodeKind};
use crate::path::append_to_path;
use crate::reference::ReferenceResolver;
use crate::schema::{is_falsy, scalar_to_string, LoadedSchema, SchemaNode};

pub const SCHEMA_DEF_SECTION_TITLE: &str = "Schema Definitions";
pub const EXAMPLE_SECTION_TITLE: &str = "Examples";
pub const INTERNAL_DEFINITIONS_SECTION_TITLE: &str = "Internal Definitions";
pub const ORIGINAL_SCHEMA_SECTION_TITLE: &str = "Original Schema";

pub const NO_LENGTH_RESTRICTION: &str = "No length restriction";
pub const NO_ADDITIONAL_ITEMS: &str = "Additional items not permitted";
pub const UNRESTRICTED: &str = "This node has no type definition (unrestricted)";
pub const ENUM_LEAD_IN: &str = "Only the following values are valid for this node:";

/// Where a combiner appears, which decides how it is wrapped and worded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CombinerPlacement {
    /// Document top level: rendered inline.
    TopLevel,
    /// Under an array's `items`: rendered inline, worded for items.
    ArrayItems,
    /// Anywhere else: rendered in a collapsible body.
    Nested,
}

/// One worked example from a schema's `examples` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    pub description: String,
    /// ASDF Standard version the example targets, when given.
    pub standard_version: Option<String>,
    pub literal: String,
}

impl Example {
    pub fn new(description: impl Into<String>, literal: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            standard_version: None,
            literal: literal.into(),
        }
    }

    /// Accepts `[description, literal]` and `[description, version, literal]`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let entries = value.as_sequence()?;
        match entries.as_slice() {
            [description, literal] => Some(Self::new(
                scalar_to_string(description),
                scalar_to_string(literal),
            )),
            [description, version, literal] => Some(Self {
                description: scalar_to_string(description),
                standard_version: Some(scalar_to_string(version)),
                literal: scalar_to_string(literal),
            }),
            _ => None,
        }
    }
}

/// Collect the examples of a schema, skipping malformed entries.
pub fn schema_examples(schema: SchemaNode<'_>) -> Vec<Example> {
    let Some(entries) = schema.get("examples").and_then(Value::as_sequence) else {
        return Vec::new();
    };
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let example = Example::from_value(entry);
            if example.is_none() {
                warn!("Skipping malformed example #{} (expected [description, literal])", index);
            }
            example
        })
        .collect()
}

/// Renders schema mappings into [`DocNode`] trees.
#[derive(Debug, Clone, Default)]
pub struct SchemaRenderer {
    resolver: ReferenceResolver,
}

impl SchemaRenderer {
    pub fn new(resolver: ReferenceResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    /// Render the complete page for a schema.
    pub fn render_schema(&self, schema: &LoadedSchema) -> DocNode {
        let node = SchemaNode::new(&schema.tree);
        let mut doc = DocNode::new(NodeKind::SchemaDoc);

        let title = node.get("title").map(scalar_to_string).unwrap_or_default();
        doc.push(DocNode::with_children(
            NodeKind::SchemaTitle,
            vec![DocNode::markdown(title)],
        ));

        let description = node.description();
        if !description.is_empty() {
            doc.push(header_title("Description"));
            doc.push(description_node(description));
        }

        let examples = schema_examples(node);
        let definitions = node.get("definitions").and_then(Value::as_mapping);

        doc.push(header_title("Outline"));
        let mut outline = vec![SCHEMA_DEF_SECTION_TITLE];
        if !examples.is_empty() {
            outline.push(EXAMPLE_SECTION_TITLE);
        }
        if definitions.is_some() {
            outline.push(INTERNAL_DEFINITIONS_SECTION_TITLE);
        }
        outline.push(ORIGINAL_SCHEMA_SECTION_TITLE);
        doc.push(DocNode::with_children(
            NodeKind::BulletList,
            outline
                .into_iter()
                .map(|text| DocNode::new(NodeKind::TocLink { text: text.to_string() }))
                .collect(),
        ));

        doc.push(section_header(SCHEMA_DEF_SECTION_TITLE));
        doc.push(self.process_properties(node, true, ""));

        if let Some(section) = self.render_examples(&examples) {
            doc.push(section_header(EXAMPLE_SECTION_TITLE));
            doc.push(section);
        }

        if let Some(definitions) = definitions {
            doc.push(section_header(INTERNAL_DEFINITIONS_SECTION_TITLE));
            let base = append_to_path("", "definitions");
            for (name, tree) in definitions {
                let name = scalar_to_string(name);
                let path = append_to_path(&base, &name);
                let required = node.is_required(&name);
                doc.push(self.create_property_node(&name, tree, required, &path));
            }
        }

        doc.push(section_header(ORIGINAL_SCHEMA_SECTION_TITLE));
        doc.push(DocNode::literal_block(schema.raw.clone(), "yaml"));

        doc
    }

    /// Render one schema node nested below `path`.
    pub fn render_properties(&self, node: SchemaNode<'_>, path: &str) -> DocNode {
        self.process_properties(node, false, path)
    }

    fn process_properties(&self, node: SchemaNode<'_>, top: bool, path: &str) -> DocNode {
        if let Some(combiner) = node.combiner() {
            let placement = if top {
                CombinerPlacement::TopLevel
            } else {
                CombinerPlacement::Nested
            };
            return self.create_combiner(node, combiner, placement, path);
        }

        let children = if node.has("properties") {
            let required = node.required();
            let items = node
                .properties()
                .into_iter()
                .map(|(key, value)| {
                    let new_path = append_to_path(path, &key);
                    let is_required = required.contains(&key);
                    self.create_property_node(&key, value, is_required, &new_path)
                })
                .collect();
            vec![
                DocNode::paragraph("This type is an object with the following properties:"),
                DocNode::with_children(NodeKind::Tree, items),
            ]
        } else if let Some(type_name) = node.get("type").map(type_name_of) {
            vec![self.process_top_type(node, &type_name, path)]
        } else if let Some(reference) = node.get("$ref").or_else(|| node.get("tag")) {
            vec![self.create_ref_node(&scalar_to_string(reference))]
        } else {
            vec![DocNode::emphasis(UNRESTRICTED)]
        };

        DocNode::with_children(NodeKind::Properties { id: path.to_string() }, children)
    }

    fn process_top_type(&self, node: SchemaNode<'_>, type_name: &str, path: &str) -> DocNode {
        let mut prop = DocNode::compound(vec![DocNode::new(NodeKind::PropertyName {
            text: type_name.to_string(),
        })]);
        prop.extend(self.validation_keywords(node, type_name, path));
        DocNode::compound(vec![prop])
    }

    fn create_ref_node(&self, reference: &str) -> DocNode {
        let resolved = self.resolver.resolve(reference, false);
        DocNode::with_children(
            NodeKind::Tree,
            vec![DocNode::new(NodeKind::Reference {
                text: resolved.display,
                href: resolved.target,
            })],
        )
    }

    fn create_combiner(
        &self,
        node: SchemaNode<'_>,
        combiner: &str,
        placement: CombinerPlacement,
        path: &str,
    ) -> DocNode {
        let container_kind = match placement {
            CombinerPlacement::Nested => NodeKind::CombinerBody {
                id: append_to_path(path, "combiner"),
            },
            CombinerPlacement::TopLevel | CombinerPlacement::ArrayItems => {
                NodeKind::Compound { id: None }
            }
        };
        let path = append_to_path(path, combiner);

        let operator = combiner.replace("Of", "");
        let text = match placement {
            CombinerPlacement::ArrayItems => {
                format!("Items in the array must be **{}** of the following types:", operator)
            }
            _ => format!("This node must validate against **{}** of the following:", operator),
        };

        let branches = node
            .get(combiner)
            .and_then(Value::as_sequence)
            .map(|seq| seq.as_slice())
            .unwrap_or_default();
        let items = branches
            .iter()
            .enumerate()
            .map(|(index, branch)| {
                let branch_path = append_to_path(&path, index);
                DocNode::with_children(
                    NodeKind::CombinerItem,
                    vec![self.process_properties(SchemaNode::new(branch), false, &branch_path)],
                )
            })
            .collect();

        let container = DocNode::with_children(
            container_kind,
            vec![
                DocNode::markdown(text),
                DocNode::with_children(NodeKind::CombinerList, items),
            ],
        );
        DocNode::with_children(NodeKind::Properties { id: path }, vec![container])
    }

    fn create_property_node(&self, name: &str, tree: &Value, required: bool, path: &str) -> DocNode {
        let node = SchemaNode::new(tree);

        let (type_name, reference) = if let Some(reference) = node.get("$ref") {
            let resolved = self.resolver.resolve(&scalar_to_string(reference), true);
            (resolved.display, Some(resolved.target))
        } else if let Some(tag) = node.get("tag") {
            let tag = scalar_to_string(tag);
            let resolved = self.resolver.resolve(&tag, true);
            // Wildcard tags match a family of types; there is no single page
            let target = (!tag.contains('*')).then_some(resolved.target);
            (resolved.display, target)
        } else {
            let type_name = node
                .get("type")
                .map(type_name_of)
                .unwrap_or_else(|| "object".to_string());
            (type_name, None)
        };

        let mut prop = DocNode::new(NodeKind::Property { id: path.to_string() });
        prop.push(DocNode::new(NodeKind::PropertyName { text: name.to_string() }));
        prop.push(DocNode::new(NodeKind::PropertyDetails {
            type_name: type_name.clone(),
            required,
            reference,
        }));
        prop.push(description_node(node.description()));

        if type_name != "object" {
            prop.extend(self.validation_keywords(node, &type_name, path));
        } else {
            prop.push(self.process_properties(node, false, path));
        }
        prop
    }

    fn validation_keywords(&self, node: SchemaNode<'_>, type_name: &str, path: &str) -> Vec<DocNode> {
        let mut nodes = Vec::new();
        let present = |key: &str| node.has(key);
        let nonzero = |key: &str| node.get(key).is_some_and(|v| !is_falsy(v));
        let value_of = |key: &str| node.get(key).map(scalar_to_string).unwrap_or_default();

        match type_name {
            "string" => {
                if !(present("minLength") || present("maxLength")) {
                    nodes.push(DocNode::emphasis(NO_LENGTH_RESTRICTION));
                }
                if nonzero("minLength") {
                    nodes.push(DocNode::paragraph(format!("Minimum length: {}", value_of("minLength"))));
                }
                if present("maxLength") {
                    nodes.push(DocNode::paragraph(format!("Maximum length: {}", value_of("maxLength"))));
                }
                if present("pattern") {
                    nodes.push(DocNode::paragraph("Must match the following pattern:"));
                    nodes.push(DocNode::literal_block(value_of("pattern"), "none"));
                }
            }
            "array" => {
                if nonzero("minItems") {
                    nodes.push(DocNode::paragraph(format!("Minimum length: {}", value_of("minItems"))));
                }
                if present("maxItems") {
                    nodes.push(DocNode::paragraph(format!("Maximum length: {}", value_of("maxItems"))));
                }
                if present("additionalItems") && present("items") {
                    let items_is_list = node.get("items").is_some_and(Value::is_sequence);
                    let closed = node.get("additionalItems") == Some(&Value::Bool(false));
                    if items_is_list && closed {
                        nodes.push(DocNode::emphasis(NO_ADDITIONAL_ITEMS));
                    }
                } else if !(present("minItems") || present("maxItems")) {
                    nodes.push(DocNode::emphasis(NO_LENGTH_RESTRICTION));
                }
                if let Some(items) = node.get("items") {
                    nodes.push(self.array_items_node(items, path));
                }
            }
            "integer" | "number" => {
                if present("minimum") {
                    nodes.push(DocNode::paragraph(format!("Minimum value: {}", value_of("minimum"))));
                }
                if present("maximum") {
                    nodes.push(DocNode::paragraph(format!("Maximum value: {}", value_of("maximum"))));
                }
            }
            _ => {}
        }

        if let Some(values) = node.get("enum") {
            nodes.push(enum_node(values));
        }

        if let Some(default) = node.get("default") {
            nodes.push(default_node(type_name, default));
        }

        nodes
    }

    fn array_items_node(&self, items: &Value, path: &str) -> DocNode {
        let path = append_to_path(path, "items");
        let items_node = SchemaNode::new(items);

        if let Some(combiner) = items_node.combiner() {
            return self.create_combiner(items_node, combiner, CombinerPlacement::ArrayItems, &path);
        }

        if let Some(list) = items.as_sequence() {
            let plural = if list.len() > 1 { "s" } else { "" };
            let entries = list
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    let item_path = append_to_path(&path, index);
                    DocNode::with_children(
                        NodeKind::ListItem,
                        vec![self.process_properties(SchemaNode::new(item), true, &item_path)],
                    )
                })
                .collect();
            DocNode::compound(vec![
                DocNode::paragraph(format!(
                    "The first {} item{} in the list must be the following types:",
                    list.len(),
                    plural
                )),
                DocNode::with_children(NodeKind::BulletList, entries),
            ])
        } else {
            DocNode::compound(vec![
                DocNode::paragraph("Items in the array are restricted to the following types:"),
                self.process_properties(items_node, true, &path),
            ])
        }
    }

    /// Render worked examples. Returns `None` when there are none.
    pub fn render_examples(&self, examples: &[Example]) -> Option<DocNode> {
        if examples.is_empty() {
            return None;
        }

        let items = examples
            .iter()
            .map(|example| {
                let mut description = DocNode::with_children(
                    NodeKind::ExampleDescription,
                    vec![DocNode::markdown(format!("{}:", example.description))],
                );
                if let Some(version) = &example.standard_version {
                    description.push(DocNode::emphasis(format!("ASDF Standard {}", version)));
                }
                DocNode::with_children(
                    NodeKind::ExampleItem,
                    vec![description, DocNode::literal_block(example.literal.clone(), "yaml")],
                )
            })
            .collect();

        Some(DocNode::with_children(
            NodeKind::ExampleSection {
                count: examples.len(),
            },
            items,
        ))
    }
}

fn header_title(text: &str) -> DocNode {
    DocNode::new(NodeKind::HeaderTitle { text: text.to_string() })
}

fn section_header(text: &str) -> DocNode {
    DocNode::new(NodeKind::SectionHeader { text: text.to_string() })
}

fn description_node(description: &str) -> DocNode {
    DocNode::with_children(NodeKind::Description, vec![DocNode::markdown(description)])
}

/// Name of a declared `type`; a list of types is joined with `|`.
fn type_name_of(value: &Value) -> String {
    match value.as_sequence() {
        Some(types) => types.iter().map(scalar_to_string).collect::<Vec<_>>().join(" | "),
        None => scalar_to_string(value),
    }
}

fn enum_node(values: &Value) -> DocNode {
    let values: Vec<String> = match values.as_sequence() {
        Some(seq) => seq.iter().map(scalar_to_string).collect(),
        None => vec![scalar_to_string(values)],
    };
    let items = values
        .into_iter()
        .map(|value| DocNode::with_children(NodeKind::ListItem, vec![DocNode::strong(value)]))
        .collect();
    DocNode::with_children(
        NodeKind::Enumeration,
        vec![
            DocNode::paragraph(ENUM_LEAD_IN),
            DocNode::with_children(NodeKind::BulletList, items),
        ],
    )
}

fn default_node(type_name: &str, default: &Value) -> DocNode {
    if matches!(type_name, "string" | "integer" | "number") {
        let text = if type_name == "string" && is_falsy(default) {
            "''".to_string()
        } else {
            scalar_to_string(default)
        };
        return DocNode::paragraph(format!("Default value: {}", text));
    }

    let formatted = serde_json::to_string_pretty(default)
        .or_else(|_| serde_yaml::to_string(default).map(|s| s.trim_end().to_string()))
        .unwrap_or_else(|_| scalar_to_string(default));
    DocNode::compound(vec![
        DocNode::paragraph("Default value:"),
        DocNode::literal_block(formatted, "none"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::IdCollector;
    use crate::reference::ReferenceMapping;

    fn load(yaml: &str) -> LoadedSchema {
        LoadedSchema::from_text("test.yaml", yaml).unwrap()
    }

    fn renderer() -> SchemaRenderer {
        SchemaRenderer::new(ReferenceResolver::new(vec![ReferenceMapping::new(
            "http://example.org/schemas/",
            "local/",
        )]))
    }

    fn render_top(yaml: &str) -> DocNode {
        let schema = load(yaml);
        renderer().process_properties(SchemaNode::new(&schema.tree), true, "")
    }

    fn count(node: &DocNode, predicate: impl Fn(&NodeKind) -> bool) -> usize {
        node.find_all(|n| predicate(&n.kind)).len()
    }

    fn has_text(node: &DocNode, needle: &str) -> bool {
        node.text().contains(needle)
    }

    #[test]
    fn test_string_without_length_keywords() {
        let node = render_top("type: string\n");
        let markers = node.find_all(|n| matches!(&n.kind, NodeKind::Emphasis { text } if text == NO_LENGTH_RESTRICTION));
        assert_eq!(markers.len(), 1);
        // Only the type name and the marker are emitted
        let prop = &node.children[0].children[0];
        assert_eq!(prop.children.len(), 2);
        assert!(matches!(&prop.children[0].kind, NodeKind::PropertyName { text } if text == "string"));
    }

    #[test]
    fn test_string_bounds_and_pattern() {
        let node = render_top("type: string\nminLength: 0\nmaxLength: 8\npattern: '^[a-z]+$'\n");
        assert!(!has_text(&node, NO_LENGTH_RESTRICTION));
        assert!(!has_text(&node, "Minimum length"));
        assert!(has_text(&node, "Maximum length: 8"));
        assert_eq!(
            count(&node, |k| matches!(k, NodeKind::LiteralBlock { text, .. } if text == "^[a-z]+$")),
            1
        );
    }

    #[test]
    fn test_tuple_array_without_additional_items() {
        let node = render_top(
            "type: array\nitems:\n  - type: string\n  - type: integer\nadditionalItems: false\n",
        );
        assert!(has_text(&node, "The first 2 items in the list must be the following types:"));
        assert!(has_text(&node, NO_ADDITIONAL_ITEMS));

        let type_names: Vec<String> = node
            .find_all(|n| matches!(n.kind, NodeKind::PropertyName { .. }))
            .iter()
            .map(|n| n.text())
            .collect();
        assert_eq!(type_names, vec!["array", "string", "integer"]);

        let mut ids = IdCollector::default();
        crate::nodes::walk(&node, &mut ids);
        assert_eq!(ids.ids, vec!["items-0", "items-1"]);
    }

    #[test]
    fn test_single_item_array() {
        let node = render_top("type: array\nminItems: 1\nitems:\n  type: number\n  minimum: 0\n");
        assert!(has_text(&node, "Minimum length: 1"));
        assert!(has_text(&node, "Items in the array are restricted to the following types:"));
        assert!(has_text(&node, "Minimum value: 0"));
        assert!(!has_text(&node, NO_LENGTH_RESTRICTION));
    }

    #[test]
    fn test_array_items_combiner_is_inline() {
        let node = render_top("type: array\nitems:\n  anyOf:\n    - type: string\n    - type: number\n");
        assert_eq!(count(&node, |k| matches!(k, NodeKind::CombinerBody { .. })), 0);
        assert!(has_text(&node, "Items in the array must be **any** of the following types:"));
        assert_eq!(count(&node, |k| matches!(k, NodeKind::CombinerItem)), 2);
        assert_eq!(
            count(&node, |k| matches!(k, NodeKind::Properties { id } if id == "items-anyof-1")),
            1
        );
    }

    #[test]
    fn test_enum_values_in_order() {
        let node = render_top("type: string\nenum: [a, b]\n");
        let enums = node.find_all(|n| matches!(n.kind, NodeKind::Enumeration));
        assert_eq!(enums.len(), 1);
        let values: Vec<String> = enums[0]
            .find_all(|n| matches!(n.kind, NodeKind::Strong { .. }))
            .iter()
            .map(|n| n.text())
            .collect();
        assert_eq!(values, vec!["a", "b"]);
    }

    #[test]
    fn test_object_properties_order_and_required() {
        let node = render_top(
            "properties:\n  zeta:\n    type: string\n  alpha:\n    type: number\n  beta: {}\nrequired: [alpha]\n",
        );
        let props = node.find_all(|n| matches!(n.kind, NodeKind::Property { .. }));
        let ids: Vec<&str> = props.iter().filter_map(|p| p.id()).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "beta"]);

        let required: Vec<bool> = node
            .find_all(|n| matches!(n.kind, NodeKind::PropertyDetails { .. }))
            .iter()
            .map(|n| matches!(n.kind, NodeKind::PropertyDetails { required: true, .. }))
            .collect();
        assert_eq!(required, vec![false, true, false]);

        // An untyped property is an object and recurses into the unrestricted marker
        assert!(has_text(&props[2], UNRESTRICTED));
    }

    #[test]
    fn test_nested_combiner_is_collapsible() {
        let node = render_top(
            "properties:\n  data:\n    oneOf:\n      - type: string\n      - $ref: '#/definitions/point'\n      - tag: 'tag:stsci.edu:asdf/core/ndarray-1.*'\n",
        );
        let bodies = node.find_all(|n| matches!(n.kind, NodeKind::CombinerBody { .. }));
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].id(), Some("data-combiner"));
        assert!(has_text(&node, "This node must validate against **one** of the following:"));

        let items = node.find_all(|n| matches!(n.kind, NodeKind::CombinerItem));
        assert_eq!(items.len(), 3);
        for (index, item) in items.iter().enumerate() {
            assert_eq!(item.children[0].id(), Some(format!("data-oneof-{}", index).as_str()));
        }

        let refs = node.find_all(|n| matches!(n.kind, NodeKind::Reference { .. }));
        assert!(matches!(&refs[0].kind, NodeKind::Reference { href, .. } if href == "#definitions-point"));
    }

    #[test]
    fn test_top_level_combiner_is_inline() {
        let node = render_top("allOf:\n  - type: object\n  - properties:\n      x: {type: number}\n");
        assert_eq!(node.id(), Some("allof"));
        assert_eq!(count(&node, |k| matches!(k, NodeKind::CombinerBody { .. })), 0);
        assert!(has_text(&node, "**all**"));
        assert_eq!(
            count(&node, |k| matches!(k, NodeKind::Property { id } if id == "allof-1-x")),
            1
        );
    }

    #[test]
    fn test_combiner_wins_over_properties() {
        let node = render_top(
            "anyOf:\n  - type: string\n  - type: number\nproperties:\n  x: {type: integer}\n",
        );
        assert_eq!(node.id(), Some("anyof"));
        assert_eq!(count(&node, |k| matches!(k, NodeKind::CombinerItem)), 2);
        assert_eq!(count(&node, |k| matches!(k, NodeKind::Property { .. })), 0);
    }

    #[test]
    fn test_properties_win_over_type() {
        let node = render_top("type: string\nproperties:\n  x: {type: integer}\n");
        assert!(has_text(&node, "This type is an object with the following properties:"));
        assert!(!has_text(&node, NO_LENGTH_RESTRICTION));
        assert_eq!(
            count(&node, |k| matches!(k, NodeKind::Property { id } if id == "x")),
            1
        );
    }

    #[test]
    fn test_type_wins_over_ref() {
        let node = render_top("type: integer\n$ref: 'http://example.org/schemas/unit-1.0.0'\n");
        assert_eq!(count(&node, |k| matches!(k, NodeKind::Reference { .. })), 0);
        assert_eq!(
            count(&node, |k| matches!(k, NodeKind::PropertyName { text } if text == "integer")),
            1
        );
    }

    #[test]
    fn test_ref_wins_over_tag() {
        let node = render_top(
            "$ref: 'http://example.org/schemas/unit-1.0.0'\ntag: 'http://example.org/schemas/other-1.0.0'\n",
        );
        let refs = node.find_all(|n| matches!(n.kind, NodeKind::Reference { .. }));
        assert_eq!(refs.len(), 1);
        assert!(matches!(&refs[0].kind, NodeKind::Reference { href, .. } if href == "local/unit-1.0.0.html"));
    }

    #[test]
    fn test_bare_tag_links_to_resolved_page() {
        let node = render_top("tag: 'http://example.org/schemas/core/ndarray-1.0.0'\n");
        assert!(!has_text(&node, UNRESTRICTED));
        let refs = node.find_all(|n| matches!(n.kind, NodeKind::Reference { .. }));
        assert_eq!(refs.len(), 1);
        assert_eq!(
            refs[0].kind,
            NodeKind::Reference {
                text: "http://example.org/schemas/core/ndarray-1.0.0".into(),
                href: "local/core/ndarray-1.0.0.html".into(),
            }
        );
    }

    #[test]
    fn test_property_reference_details() {
        let node = render_top(
            "properties:\n  unit:\n    $ref: 'http://example.org/schemas/unit/unit-1.0.0'\n  local:\n    $ref: '#/definitions/point'\n  wild:\n    tag: 'tag:stsci.edu:asdf/core/ndarray-1.*'\n  exact:\n    tag: 'ndarray-1.0.0'\n",
        );
        let details: Vec<&NodeKind> = node
            .find_all(|n| matches!(n.kind, NodeKind::PropertyDetails { .. }))
            .into_iter()
            .map(|n| &n.kind)
            .collect();
        assert_eq!(
            details[0],
            &NodeKind::PropertyDetails {
                type_name: "http://example.org/schemas/unit/unit-1.0.0".into(),
                required: false,
                reference: Some("local/unit/unit-1.0.0.html".into()),
            }
        );
        assert!(matches!(details[1], NodeKind::PropertyDetails { type_name, reference: Some(r), .. } if type_name == "point" && r == "#definitions-point"));
        assert!(matches!(details[2], NodeKind::PropertyDetails { reference: None, .. }));
        assert!(matches!(details[3], NodeKind::PropertyDetails { reference: Some(r), .. } if r == "ndarray-1.0.0.html"));
    }

    #[test]
    fn test_defaults() {
        let node = render_top("properties:\n  name:\n    type: string\n    default: ''\n  count:\n    type: integer\n    default: 3\n  shape:\n    type: array\n    default: [1, 2]\n");
        assert!(has_text(&node, "Default value: ''"));
        assert!(has_text(&node, "Default value: 3"));
        let literals = node.find_all(|n| matches!(&n.kind, NodeKind::LiteralBlock { language, .. } if language == "none"));
        assert_eq!(literals.len(), 1);
        assert!(literals[0].text().contains('1') && literals[0].text().contains('2'));
    }

    #[test]
    fn test_unknown_keywords_are_ignored() {
        let node = render_top("type: integer\nx-custom: 12\nmaximum: 10\n");
        assert!(has_text(&node, "Maximum value: 10"));
        assert!(!has_text(&node, "x-custom"));
    }

    #[test]
    fn test_full_document_sections() {
        let yaml = "title: Complex number\ndescription: A *complex* value.\ntype: string\nrequired: [point]\nexamples:\n  - - A simple example\n    - '!core/complex-1.0.0 1+2j'\ndefinitions:\n  point:\n    type: number\n";
        let schema = load(yaml);
        let doc = renderer().render_schema(&schema);

        let sections: Vec<String> = doc
            .find_all(|n| matches!(n.kind, NodeKind::SectionHeader { .. }))
            .iter()
            .map(|n| n.text())
            .collect();
        assert_eq!(
            sections,
            vec![
                SCHEMA_DEF_SECTION_TITLE,
                EXAMPLE_SECTION_TITLE,
                INTERNAL_DEFINITIONS_SECTION_TITLE,
                ORIGINAL_SCHEMA_SECTION_TITLE
            ]
        );
        let toc = doc.find_all(|n| matches!(n.kind, NodeKind::TocLink { .. }));
        assert_eq!(toc.len(), 4);

        let definition = doc
            .find_all(|n| matches!(&n.kind, NodeKind::Property { id } if id == "definitions-point"));
        assert_eq!(definition.len(), 1);
        assert!(matches!(
            definition[0].children[1].kind,
            NodeKind::PropertyDetails { required: true, .. }
        ));

        match &doc.children.last().unwrap().kind {
            NodeKind::LiteralBlock { text, language } => {
                assert_eq!(text, yaml);
                assert_eq!(language, "yaml");
            }
            other => panic!("expected original schema, got {:?}", other),
        }
    }

    #[test]
    fn test_minimal_document_has_no_optional_sections() {
        let doc = renderer().render_schema(&load("type: object\n"));
        assert!(!has_text(&doc, EXAMPLE_SECTION_TITLE));
        assert!(!has_text(&doc, INTERNAL_DEFINITIONS_SECTION_TITLE));
        assert!(!has_text(&doc, "Description"));
    }

    #[test]
    fn test_examples() {
        let examples = vec![
            Example::new("First", "a: 1"),
            Example {
                description: "Second".into(),
                standard_version: Some("1.6.0".into()),
                literal: "b: 2".into(),
            },
        ];
        let section = renderer().render_examples(&examples).unwrap();
        assert!(matches!(section.kind, NodeKind::ExampleSection { count: 2 }));
        assert_eq!(section.children.len(), 2);
        assert!(has_text(&section.children[0], "First:"));
        assert!(has_text(&section.children[1], "ASDF Standard 1.6.0"));
        assert!(renderer().render_examples(&[]).is_none());
    }

    #[test]
    fn test_malformed_examples_are_skipped() {
        let schema = load("examples:\n  - just a string\n  - [desc, 'x: 1']\n");
        let examples = schema_examples(SchemaNode::new(&schema.tree));
        assert_eq!(examples, vec![Example::new("desc", "x: 1")]);
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let schema = load("properties:\n  a:\n    anyOf:\n      - type: string\n      - type: array\n        items: {type: number}\n");
        let r = renderer();
        assert_eq!(r.render_schema(&schema), r.render_schema(&schema));
    }
}
