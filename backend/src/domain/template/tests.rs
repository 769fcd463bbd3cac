//! Tests for template content validation and lineage row construction.

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};
use rstest_bdd_macros::{given, then, when};
use serde_json::json;

use super::*;

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

fn roof_survey() -> TemplateDraft {
    TemplateDraft {
        name: "  Roof survey ".to_owned(),
        description: Some("   ".to_owned()),
        category: Some("Building".to_owned()),
        fields_schema: json!([
            { "name": "pitch", "type": "number", "required": true },
            { "name": "notes", "type": "text" }
        ]),
    }
}

#[fixture]
fn now() -> DateTime<Utc> {
    fixed_now()
}

#[fixture]
fn draft() -> TemplateDraft {
    roof_survey()
}

#[rstest]
#[case(json!({}), TemplateValidationError::SchemaNotArray)]
#[case(json!([]), TemplateValidationError::EmptySchema)]
#[case(json!(["pitch"]), TemplateValidationError::FieldNotObject { index: 0 })]
#[case(json!([{ "type": "text" }]), TemplateValidationError::FieldMissingName { index: 0 })]
#[case(json!([{ "name": "a", "type": "text" }, { "name": " ", "type": "text" }]), TemplateValidationError::FieldMissingName { index: 1 })]
#[case(json!([{ "name": "a" }]), TemplateValidationError::FieldMissingType { index: 0 })]
#[case(json!([{ "name": "a", "type": 3 }]), TemplateValidationError::FieldMissingType { index: 0 })]
#[case(
    json!([{ "name": "a", "type": "text" }, { "name": "a", "type": "number" }]),
    TemplateValidationError::DuplicateFieldName { name: "a".to_owned() }
)]
fn malformed_schemas_are_rejected(
    #[case] raw: Value,
    #[case] expected: TemplateValidationError,
) {
    assert_eq!(FieldsSchema::new(raw), Err(expected));
}

#[rstest]
fn schema_keeps_extra_keys() {
    let raw = json!([{ "name": "a", "type": "select", "options": ["x", "y"] }]);
    let schema = FieldsSchema::new(raw.clone()).expect("valid schema");
    assert_eq!(schema.as_value(), &raw);
}

#[rstest]
fn schema_deserialisation_validates() {
    let result = serde_json::from_value::<FieldsSchema>(json!([]));
    assert!(result.is_err());
}

#[rstest]
fn draft_validation_trims_and_drops_blanks(draft: TemplateDraft) {
    let content = draft.validate().expect("valid draft");
    assert_eq!(content.name, "Roof survey");
    assert_eq!(content.description, None);
    assert_eq!(content.category.as_deref(), Some("Building"));
    assert_eq!(content.fields_schema.field_names(), vec!["pitch", "notes"]);
}

#[rstest]
fn draft_with_blank_name_is_rejected(mut draft: TemplateDraft) {
    draft.name = "   ".to_owned();
    assert_eq!(draft.validate(), Err(TemplateValidationError::EmptyName));
}

#[rstest]
fn root_starts_a_lineage(draft: TemplateDraft, now: DateTime<Utc>) {
    let content = draft.validate().expect("valid draft");
    let root = Template::root(OrganizationId::random(), UserId::random(), content, now);

    assert_eq!(root.version, 1);
    assert_eq!(root.lineage_id, root.id);
    assert!(root.is_root());
    assert!(root.is_latest_version);
    assert!(root.is_active());
    assert_eq!(root.version_notes, None);
}

#[rstest]
#[case(Some("added field".to_owned()), "added field")]
#[case(None, "Version 2")]
#[case(Some("  ".to_owned()), "Version 2")]
fn successor_links_to_parent(
    draft: TemplateDraft,
    now: DateTime<Utc>,
    #[case] notes: Option<String>,
    #[case] expected_notes: &str,
) {
    let content = draft.validate().expect("valid draft");
    let root = Template::root(OrganizationId::random(), UserId::random(), content.clone(), now);

    let next = root.successor(UserId::random(), content, notes, now);

    assert_eq!(next.version, 2);
    assert_eq!(next.parent_template_id, Some(root.id));
    assert_eq!(next.lineage_id, root.lineage_id);
    assert_eq!(next.organization_id, root.organization_id);
    assert_ne!(next.id, root.id);
    assert_eq!(next.version_notes.as_deref(), Some(expected_notes));
}

#[rstest]
fn update_carries_unchanged_fields_forward(draft: TemplateDraft, now: DateTime<Utc>) {
    let content = draft.validate().expect("valid draft");
    let root = Template::root(OrganizationId::random(), UserId::random(), content, now);

    let merged = TemplateUpdate {
        name: Some("Roof survey v2".to_owned()),
        ..TemplateUpdate::default()
    }
    .apply_to(&root)
    .expect("valid update");

    assert_eq!(merged.name, "Roof survey v2");
    assert_eq!(merged.category, root.category);
    assert_eq!(merged.fields_schema, root.fields_schema);
}

#[rstest]
fn update_with_bad_schema_is_rejected(draft: TemplateDraft, now: DateTime<Utc>) {
    let content = draft.validate().expect("valid draft");
    let root = Template::root(OrganizationId::random(), UserId::random(), content, now);

    let result = TemplateUpdate {
        fields_schema: Some(json!([])),
        ..TemplateUpdate::default()
    }
    .apply_to(&root);

    assert_eq!(result, Err(TemplateValidationError::EmptySchema));
}

#[rstest]
fn lifecycle_reports_deletion_instant(now: DateTime<Utc>) {
    let deleted = LifecycleState::Deleted { deleted_at: now };
    assert!(!deleted.is_active());
    assert_eq!(deleted.deleted_at(), Some(now));
    assert_eq!(LifecycleState::Active.deleted_at(), None);
}

#[given("a template owned by another organisation")]
fn a_template_owned_by_another_organisation() -> Template {
    let content = roof_survey().validate().expect("valid draft");
    Template::root(OrganizationId::random(), UserId::random(), content, fixed_now())
}

#[when("it is duplicated into the caller's organisation")]
fn it_is_duplicated(source: Template, target: OrganizationId) -> (Template, Template) {
    let copy = source.duplicate_into(target, UserId::random(), fixed_now());
    (source, copy)
}

#[then("the copy starts a fresh lineage owned by the caller")]
fn the_copy_starts_a_fresh_lineage(pair: (Template, Template), target: OrganizationId) {
    let (source, copy) = pair;
    assert_eq!(copy.organization_id, target);
    assert_eq!(copy.version, 1);
    assert_eq!(copy.lineage_id, copy.id);
    assert_ne!(copy.lineage_id, source.lineage_id);
    assert_eq!(copy.fields_schema, source.fields_schema);
    assert_eq!(copy.name, source.name);
}

#[rstest]
fn duplicating_across_organisations() {
    let source = a_template_owned_by_another_organisation();
    let target = OrganizationId::random();
    let pair = it_is_duplicated(source, target);
    the_copy_starts_a_fresh_lineage(pair, target);
}
