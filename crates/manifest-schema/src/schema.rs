//! JSON schema for the version-independent CustomResourceDefinition form.
//!
//! Only shape rules live here (presence, types, name formats). Rules that
//! relate fields to each other are enforced by [`crate::structural`].

/// JSON Schema for a serialized [`crate::CanonicalCrd`].
///
/// Required strings carry `minLength: 1` and name patterns accept the empty
/// string, so an unset field yields exactly one violation.
pub const CANONICAL_CRD_SCHEMA: &str = r#"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "$id": "https://opcheck.dev/schemas/canonical-crd.json",
  "title": "Canonical CustomResourceDefinition",
  "type": "object",
  "required": ["metadata", "spec"],
  "properties": {
    "metadata": {
      "type": "object",
      "required": ["name"],
      "properties": {
        "name": {
          "type": "string",
          "minLength": 1,
          "maxLength": 253,
          "pattern": "^([a-z0-9]([-a-z0-9]*[a-z0-9])?(\\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*)?$"
        }
      }
    },
    "spec": {
      "type": "object",
      "required": ["group", "names", "scope", "versions"],
      "properties": {
        "group": {
          "type": "string",
          "minLength": 1,
          "maxLength": 253,
          "pattern": "^([a-z0-9]([-a-z0-9]*[a-z0-9])?(\\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*)?$"
        },
        "version": { "type": "string" },
        "names": {
          "type": "object",
          "required": ["plural", "singular", "kind", "listKind"],
          "properties": {
            "plural": {
              "type": "string",
              "minLength": 1,
              "maxLength": 63,
              "pattern": "^([a-z0-9]([-a-z0-9]*[a-z0-9])?)?$"
            },
            "singular": {
              "type": "string",
              "maxLength": 63,
              "pattern": "^([a-z0-9]([-a-z0-9]*[a-z0-9])?)?$"
            },
            "kind": {
              "type": "string",
              "minLength": 1,
              "pattern": "^([A-Za-z][A-Za-z0-9]*)?$"
            },
            "listKind": {
              "type": "string",
              "minLength": 1,
              "pattern": "^([A-Za-z][A-Za-z0-9]*)?$"
            },
            "shortNames": {
              "type": "array",
              "items": {
                "type": "string",
                "minLength": 1,
                "pattern": "^([a-z0-9]([-a-z0-9]*[a-z0-9])?)?$"
              }
            },
            "categories": {
              "type": "array",
              "items": { "type": "string", "minLength": 1 }
            }
          }
        },
        "scope": {
          "type": "string",
          "enum": ["Cluster", "Namespaced"]
        },
        "versions": {
          "type": "array",
          "minItems": 1,
          "items": {
            "type": "object",
            "required": ["name", "served", "storage"],
            "properties": {
              "name": {
                "type": "string",
                "minLength": 1,
                "maxLength": 63,
                "pattern": "^([a-z0-9]([-a-z0-9]*[a-z0-9])?)?$"
              },
              "served": { "type": "boolean" },
              "storage": { "type": "boolean" },
              "schema": { "type": "object" },
              "subresources": { "type": ["object", "null"] }
            }
          }
        },
        "validation": { "type": "object" },
        "subresources": { "type": ["object", "null"] }
      }
    }
  }
}"#;

/// Get the canonical CRD schema as a JSON value.
pub fn canonical_crd_schema() -> serde_json::Value {
    serde_json::from_str(CANONICAL_CRD_SCHEMA).expect("Invalid canonical CRD schema")
}
