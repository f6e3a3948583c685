//! OpenAPI fragment for the books module; paths are relative to `/api/books`.

use serde_json::{json, Value};

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: Value) -> Value {
    json!({
        "description": description,
        "content": { "application/json": { "schema": schema } }
    })
}

fn book_ref() -> Value {
    json!({ "$ref": "#/components/schemas/Book" })
}

fn book_list() -> Value {
    json!({ "type": "array", "items": book_ref() })
}

fn id_parameter() -> Value {
    json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    })
}

fn json_body(schema: Value) -> Value {
    json!({
        "required": true,
        "content": { "application/json": { "schema": schema } }
    })
}

pub fn fragment() -> Value {
    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List all books",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response("Every book, oldest first", book_list()),
                        "500": error_response("Store failure")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": json_body(json!({ "$ref": "#/components/schemas/NewBook" })),
                    "responses": {
                        "201": json_response("Created book", book_ref()),
                        "400": error_response("Invalid book"),
                        "500": error_response("Store failure")
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            },
            "/seed": {
                "post": {
                    "summary": "Insert a batch of books",
                    "description": "All records are validated first; one invalid record rejects the batch.",
                    "tags": ["Books"],
                    "requestBody": json_body(json!({
                        "type": "array",
                        "minItems": 1,
                        "items": { "$ref": "#/components/schemas/NewBook" }
                    })),
                    "responses": {
                        "201": json_response("Books added", json!({
                            "type": "object",
                            "properties": {
                                "message": { "type": "string" },
                                "data": book_list()
                            },
                            "required": ["message", "data"]
                        })),
                        "400": error_response("Empty, non-array or invalid batch"),
                        "500": error_response("Store failure")
                    }
                }
            },
            "/after-threshold": {
                "get": {
                    "summary": "Books published after a year",
                    "tags": ["Books"],
                    "parameters": [{
                        "name": "year",
                        "in": "query",
                        "required": false,
                        "description": "Defaults to catalog.recent_after_year",
                        "schema": { "type": "integer" }
                    }],
                    "responses": {
                        "200": json_response("Matching books", book_list()),
                        "400": error_response("Invalid year"),
                        "500": error_response("Store failure")
                    }
                }
            },
            "/category/{category}": {
                "get": {
                    "summary": "Books in a category",
                    "tags": ["Books"],
                    "parameters": [{
                        "name": "category",
                        "in": "path",
                        "required": true,
                        "schema": { "type": "string" }
                    }],
                    "responses": {
                        "200": json_response("Matching books", book_list()),
                        "404": error_response("No books in this category"),
                        "500": error_response("Store failure")
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Fetch a book",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": json_response("The book", book_ref()),
                        "404": error_response("Book not found")
                    }
                },
                "delete": {
                    "summary": "Delete a book with no available copies",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "responses": {
                        "200": json_response("Deleted", json!({
                            "type": "object",
                            "properties": { "message": { "type": "string" } },
                            "required": ["message"]
                        })),
                        "400": error_response("Copies remaining"),
                        "404": error_response("Book not found")
                    }
                }
            },
            "/{id}/copies": {
                "patch": {
                    "summary": "Adjust available copies",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "requestBody": json_body(json!({
                        "type": "object",
                        "properties": {
                            "change": { "type": "integer", "minimum": -2147483647, "maximum": 2147483647 }
                        },
                        "required": ["change"]
                    })),
                    "responses": {
                        "200": json_response("Updated book", book_ref()),
                        "400": error_response("Invalid change, unknown book or result below zero")
                    }
                }
            },
            "/{id}/category": {
                "patch": {
                    "summary": "Change category",
                    "tags": ["Books"],
                    "parameters": [id_parameter()],
                    "requestBody": json_body(json!({
                        "type": "object",
                        "properties": { "category": { "type": "string", "minLength": 1 } },
                        "required": ["category"]
                    })),
                    "responses": {
                        "200": json_response("Updated book", book_ref()),
                        "400": error_response("Invalid category"),
                        "404": error_response("Book not found")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "NewBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string", "minLength": 1 },
                        "author": { "type": "string", "minLength": 1 },
                        "category": { "type": "string", "minLength": 1 },
                        "publishedYear": {
                            "type": "integer",
                            "minimum": 1000,
                            "description": "No later than the current year"
                        },
                        "availableCopies": { "type": "integer", "minimum": 0, "maximum": 2147483647 }
                    },
                    "required": ["title", "author", "category", "publishedYear", "availableCopies"]
                },
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "description": "UUIDv7 assigned on insert" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "category": { "type": "string" },
                        "publishedYear": { "type": "integer" },
                        "availableCopies": { "type": "integer", "minimum": 0, "maximum": 2147483647 },
                        "createdAt": { "type": "string", "format": "date-time" },
                        "updatedAt": { "type": "string", "format": "date-time" }
                    },
                    "required": [
                        "id", "title", "author", "category", "publishedYear",
                        "availableCopies", "createdAt", "updatedAt"
                    ]
                }
            }
        }
    })
}
