//! Tool names, input schemas and argument shapes.

use std::sync::Arc;

use rmcp::model::{JsonObject, Tool};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    search::SearchCriteria,
    service::{KeyRef, KeyUpdate, NewKey, TranslationItem},
};

pub const ADD_KEYS: &str = "add_lokalise_keys";
pub const UPDATE_KEYS: &str = "update_lokalise_keys";
pub const DELETE_KEYS: &str = "delete_lokalise_keys";
pub const MANAGE_TRANSLATIONS: &str = "manage_lokalise_translations";
pub const SEARCH_KEYS: &str = "search_lokalise_keys";
pub const SEARCH_PROJECTS: &str = "search_available_projects";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeysArgs<T> {
    pub project_name: Option<String>,
    pub keys: Option<Vec<T>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslationsArgs {
    pub project_name: Option<String>,
    pub translations: Option<Vec<TranslationItem>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchKeysArgs {
    pub project_name: Option<String>,
    pub criteria: Option<SearchCriteria>,
    pub limit: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchProjectsArgs {
    pub search_term: Option<String>,
}

pub type AddKeysArgs = KeysArgs<NewKey>;
pub type UpdateKeysArgs = KeysArgs<KeyUpdate>;
pub type DeleteKeysArgs = KeysArgs<KeyRef>;

fn schema(value: Value) -> Arc<JsonObject> {
    match value {
        Value::Object(map) => Arc::new(map),
        _ => Arc::new(JsonObject::new()),
    }
}

fn string_list(description: &str) -> Value {
    json!({ "type": "array", "items": { "type": "string" }, "description": description })
}

fn language_texts(description: &str) -> Value {
    json!({
        "type": "object",
        "description": description,
        "properties": {
            "en": { "type": "string", "description": "English translation" },
            "de": { "type": "string", "description": "German translation" }
        },
        "additionalProperties": { "type": "string" }
    })
}

fn project_name() -> Value {
    json!({ "type": "string", "description": "Lokalise project name" })
}

/// Every tool this server exposes, in listing order.
pub fn definitions() -> Vec<Tool> {
    vec![
        Tool::new(
            ADD_KEYS,
            "Add multiple translation keys to a Lokalise project using structured input",
            schema(json!({
                "type": "object",
                "properties": {
                    "projectName": project_name(),
                    "keys": {
                        "type": "array",
                        "description": "Array of keys to add",
                        "items": {
                            "type": "object",
                            "properties": {
                                "keyName": { "type": "string", "description": "Key to add" },
                                "defaultValue": {
                                    "type": "string",
                                    "description": "Default value for the key (optional)"
                                },
                                "platforms": string_list("Platforms (web, ios, android, other). Optional."),
                                "description": {
                                    "type": "string",
                                    "description": "Description for the key (optional)"
                                },
                                "tags": string_list("Tags for the key (optional)")
                            },
                            "required": ["keyName"]
                        }
                    }
                },
                "required": ["projectName", "keys"]
            })),
        ),
        Tool::new(
            UPDATE_KEYS,
            "Update existing translation keys in a Lokalise project with new properties and translations",
            schema(json!({
                "type": "object",
                "properties": {
                    "projectName": project_name(),
                    "keys": {
                        "type": "array",
                        "description": "Array of keys to update",
                        "items": {
                            "type": "object",
                            "properties": {
                                "keyName": {
                                    "type": "string",
                                    "description": "Name of the existing key to update"
                                },
                                "platforms": string_list("New platforms (web, ios, android, other). Optional."),
                                "description": {
                                    "type": "string",
                                    "description": "New description for the key (optional)"
                                },
                                "tags": string_list("New tags for the key (optional)"),
                                "translations": language_texts(
                                    "Translations for different languages (en, de supported)"
                                )
                            },
                            "required": ["keyName"]
                        }
                    }
                },
                "required": ["projectName", "keys"]
            })),
        ),
        Tool::new(
            DELETE_KEYS,
            "Delete translation keys from a Lokalise project",
            schema(json!({
                "type": "object",
                "properties": {
                    "projectName": project_name(),
                    "keys": {
                        "type": "array",
                        "description": "Array of keys to delete",
                        "items": {
                            "type": "object",
                            "properties": {
                                "keyName": { "type": "string", "description": "Name of the key to delete" }
                            },
                            "required": ["keyName"]
                        }
                    }
                },
                "required": ["projectName", "keys"]
            })),
        ),
        Tool::new(
            MANAGE_TRANSLATIONS,
            "Manage translations for existing keys in multiple languages (German and English focus)",
            schema(json!({
                "type": "object",
                "properties": {
                    "projectName": project_name(),
                    "translations": {
                        "type": "array",
                        "description": "Array of translation updates",
                        "items": {
                            "type": "object",
                            "properties": {
                                "keyName": { "type": "string", "description": "Name of the existing key" },
                                "translations": language_texts("Translations for different languages"),
                                "markAsReviewed": {
                                    "type": "boolean",
                                    "description": "Mark translations as reviewed (optional)"
                                }
                            },
                            "required": ["keyName", "translations"]
                        }
                    }
                },
                "required": ["projectName", "translations"]
            })),
        ),
        Tool::new(
            SEARCH_KEYS,
            "Search for translation keys in a Lokalise project based on various criteria like name patterns, tags, platforms, translation status, etc.",
            schema(json!({
                "type": "object",
                "properties": {
                    "projectName": project_name(),
                    "criteria": {
                        "type": "object",
                        "description": "Search criteria to filter keys",
                        "properties": {
                            "keyNamePattern": {
                                "type": "string",
                                "description": "Partial match in key name (e.g., \"error\" finds \"error_message\", \"user_error\")"
                            },
                            "keyNameExact": { "type": "string", "description": "Exact key name match" },
                            "tags": string_list("Must have all these tags (e.g., [\"urgent\", \"frontend\"])"),
                            "platforms": string_list("Must be available on these platforms (web, ios, android, other)"),
                            "translationStatus": {
                                "type": "string",
                                "enum": ["translated", "untranslated", "fuzzy", "reviewed", "any"],
                                "description": "Filter by translation status: translated=has text, untranslated=missing text, fuzzy=needs review, reviewed=approved, any=all"
                            },
                            "languages": string_list("Check translation status for these languages (en, de supported)"),
                            "hasDescription": {
                                "type": "boolean",
                                "description": "Filter keys that have (true) or don't have (false) descriptions"
                            },
                            "descriptionPattern": {
                                "type": "string",
                                "description": "Partial match in key description"
                            },
                            "createdAfter": {
                                "type": "string",
                                "description": "Find keys created after this date (ISO format: 2024-01-01)"
                            },
                            "createdBefore": {
                                "type": "string",
                                "description": "Find keys created before this date (ISO format: 2024-12-31)"
                            }
                        },
                        "additionalProperties": false
                    },
                    "limit": {
                        "type": "number",
                        "description": "Maximum number of results to return (default: 50, max: 200)",
                        "minimum": 1,
                        "maximum": 200
                    }
                },
                "required": ["projectName", "criteria"]
            })),
        ),
        Tool::new(
            SEARCH_PROJECTS,
            "Search for available Lokalise projects that you have access to",
            schema(json!({
                "type": "object",
                "properties": {
                    "searchTerm": {
                        "type": "string",
                        "description": "Optional search term to filter projects by name or description"
                    }
                },
                "required": []
            })),
        ),
    ]
}
