use quarry_core::error::SchemaError;
use quarry_core::field::{FieldSpec, IndexKind, KeywordDelimiter};
use quarry_core::format::Templates;
use quarry_core::schema::Schema;

fn movie_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("movie_id", IndexKind::Stored),
        FieldSpec::new("title", IndexKind::Ngram),
        FieldSpec::new("description", IndexKind::Phrase),
        FieldSpec::new("genres", IndexKind::Keyword),
        FieldSpec::new("year", IndexKind::Numeric),
    ]
}

#[test]
fn searchable_fields_exclude_store_only_and_keep_group_order() {
    let schema = Schema::new(movie_fields(), Templates::default()).unwrap();
    let names: Vec<&str> = schema.searchable_fields().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["title", "description", "genres", "year"]);
}

#[test]
fn ngram_words_fields_sort_into_the_ngram_group() {
    let mut fields = movie_fields();
    fields.push(FieldSpec::new("aliases", IndexKind::NgramWords));
    let schema = Schema::new(fields, Templates::default()).unwrap();
    let names: Vec<&str> = schema.searchable_fields().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["title", "aliases", "description", "genres", "year"]);
}

#[test]
fn stored_and_sortable_views() {
    let mut fields = movie_fields();
    fields[4].sortable = true;
    let schema = Schema::new(fields, Templates::default()).unwrap();

    let stored: Vec<&str> = schema.stored_fields().map(|f| f.name.as_str()).collect();
    assert_eq!(stored, vec!["movie_id", "title", "description", "genres", "year"]);

    let sortable: Vec<&str> = schema.sortable_fields().map(|f| f.name.as_str()).collect();
    assert_eq!(sortable, vec!["year"]);
}

#[test]
fn duplicate_field_names_are_rejected() {
    let fields = vec![
        FieldSpec::new("title", IndexKind::Ngram),
        FieldSpec::new("title", IndexKind::Phrase),
    ];
    assert!(matches!(
        Schema::new(fields, Templates::default()),
        Err(SchemaError::DuplicateField { name }) if name == "title"
    ));
}

#[test]
fn sortable_field_must_be_stored() {
    let mut field = FieldSpec::new("title", IndexKind::Ngram);
    field.stored = false;
    field.sortable = true;
    let fields = vec![FieldSpec::new("title2", IndexKind::Ngram), field];
    // Title fallback is irrelevant here; the sortable check fires first.
    assert!(matches!(
        Schema::new(fields, Templates::default()),
        Err(SchemaError::SortableNotStored { name }) if name == "title"
    ));
}

#[test]
fn ngram_range_must_be_ordered_and_positive() {
    let mut field = FieldSpec::new("title", IndexKind::Ngram);
    field.ngram_min = 8;
    field.ngram_max = 3;
    assert!(matches!(
        Schema::new(vec![field], Templates::default()),
        Err(SchemaError::InvalidNgramRange { min: 8, max: 3, .. })
    ));

    let mut field = FieldSpec::new("title", IndexKind::Ngram);
    field.ngram_min = 0;
    assert!(matches!(
        Schema::new(vec![field], Templates::default()),
        Err(SchemaError::InvalidNgramRange { min: 0, .. })
    ));
}

#[test]
fn weight_must_be_positive() {
    let mut field = FieldSpec::new("title", IndexKind::Ngram);
    field.weight = 0.0;
    assert!(matches!(
        Schema::new(vec![field], Templates::default()),
        Err(SchemaError::InvalidWeight { .. })
    ));
}

#[test]
fn template_referencing_unknown_field_is_rejected() {
    let templates = Templates {
        subtitle: Some("{director}".to_string()),
        ..Templates::default()
    };
    assert!(matches!(
        Schema::new(movie_fields(), templates),
        Err(SchemaError::UnknownTemplateField { slot: "subtitle", field }) if field == "director"
    ));
}

#[test]
fn template_referencing_unstored_field_is_rejected() {
    let mut fields = movie_fields();
    fields[2].stored = false;
    let templates = Templates {
        subtitle: Some("{description}".to_string()),
        ..Templates::default()
    };
    assert!(matches!(
        Schema::new(fields, templates),
        Err(SchemaError::UnstoredTemplateField { slot: "subtitle", field }) if field == "description"
    ));
}

#[test]
fn absent_title_template_requires_a_stored_title_field() {
    let fields = vec![FieldSpec::new("name", IndexKind::Ngram)];
    assert!(matches!(
        Schema::new(fields, Templates::default()),
        Err(SchemaError::MissingTitleField)
    ));

    // A title template lifts the requirement.
    let fields = vec![FieldSpec::new("name", IndexKind::Ngram)];
    let templates = Templates {
        title: Some("{name}".to_string()),
        ..Templates::default()
    };
    assert!(Schema::new(fields, templates).is_ok());
}

#[test]
fn document_with_exactly_one_type_flag_decodes_with_defaults() {
    let schema = Schema::from_document(
        r#"{
            "fields": [
                {"name": "movie_id", "type_is_store": true},
                {"name": "title", "type_is_ngram": true},
                {"name": "description", "type_is_phrase": true},
                {"name": "genres", "type_is_keyword": true},
                {"name": "year", "type_is_numeric": true, "is_sortable": true,
                 "is_sort_ascending": false}
            ]
        }"#,
    )
    .unwrap();

    let title = schema.field("title").unwrap();
    assert_eq!(title.ngram_min, 2);
    assert_eq!(title.ngram_max, 10);
    assert_eq!(title.weight, 1.0);
    assert!(title.stored);

    let genres = schema.field("genres").unwrap();
    assert!(genres.keyword_case_insensitive);
    assert_eq!(genres.keyword_delimiter, KeywordDelimiter::Comma);

    let year = schema.field("year").unwrap();
    assert!(year.sortable);
    assert!(!year.sort_ascending);
}

#[test]
fn document_with_two_type_flags_is_rejected() {
    let result = Schema::from_document(
        r#"{
            "fields": [
                {"name": "title", "type_is_ngram": true, "type_is_phrase": true}
            ]
        }"#,
    );
    assert!(matches!(
        result,
        Err(SchemaError::InvalidIndexKind { name }) if name == "title"
    ));
}

#[test]
fn document_with_no_type_flag_is_rejected() {
    let result = Schema::from_document(r#"{"fields": [{"name": "title"}]}"#);
    assert!(matches!(
        result,
        Err(SchemaError::InvalidIndexKind { name }) if name == "title"
    ));
}

#[test]
fn document_that_is_not_json_is_rejected() {
    assert!(matches!(
        Schema::from_document("not json"),
        Err(SchemaError::Decode(_))
    ));
}

#[test]
fn store_only_fields_are_always_stored() {
    let schema = Schema::from_document(
        r#"{
            "fields": [
                {"name": "title", "type_is_ngram": true},
                {"name": "movie_id", "type_is_store": true, "stored": false}
            ]
        }"#,
    )
    .unwrap();
    assert!(schema.field("movie_id").unwrap().stored);
}
