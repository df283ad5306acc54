use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use serde_json::json;

use nested_builder::{
    attributes_from_json, reconcile_many, reconcile_one, ChildDocument, Decision, IdType,
    NestedOptions, NestedOptionsConfig, ObjectId, ReconciliationPolicy, RejectIf,
    RelationMetadata, SkipReason, TargetModel, Value,
};

struct Address {
    id: Value,
    street: String,
}

impl ChildDocument for Address {
    fn id(&self) -> &Value {
        &self.id
    }
}

fn policy(meta: RelationMetadata, options: NestedOptions) -> ReconciliationPolicy {
    ReconciliationPolicy::new(Arc::new(meta), Arc::new(options)).unwrap()
}

#[test]
fn default_options_permit_nothing_and_reject_nothing() {
    let policy = policy(
        RelationMetadata::many("addresses", TargetModel::with_object_ids("Address")),
        NestedOptions::default(),
    );

    assert!(!policy.allow_destroy());
    assert!(!policy.update_only());
    let payload = attributes_from_json(json!({"name": "x"})).unwrap();
    assert!(!policy.reject(&payload));
}

#[test]
fn allow_destroy_combines_with_payload_flag() {
    let policy = policy(
        RelationMetadata::many("addresses", TargetModel::new("Address", IdType::Int)),
        NestedOptions::new().allow_destroy(true),
    );
    assert!(policy.allow_destroy());

    let existing = vec![Address {
        id: Value::Int(3),
        street: "Main".to_string(),
    }];
    let payload = attributes_from_json(json!({"id": 3, "_destroy": "1"})).unwrap();
    let decisions = reconcile_many(&policy, vec![payload], &existing).unwrap();
    assert_eq!(decisions, vec![Decision::Destroy { id: Value::Int(3) }]);
}

#[test]
fn reject_if_blank_name() {
    let options = NestedOptions::new().with_reject_if(RejectIf::predicate(|attrs| {
        attrs
            .get("name")
            .and_then(Value::as_string)
            .map_or(true, str::is_empty)
    }));
    let policy = policy(
        RelationMetadata::many("addresses", TargetModel::with_object_ids("Address")),
        options,
    );

    let empty = attributes_from_json(json!({"name": ""})).unwrap();
    let named = attributes_from_json(json!({"name": "Ann"})).unwrap();
    assert!(policy.reject(&empty));
    assert!(!policy.reject(&named));
}

#[test]
fn numeric_id_from_text() {
    let policy = policy(
        RelationMetadata::many("addresses", TargetModel::new("Address", IdType::Int)),
        NestedOptions::default(),
    );
    assert_eq!(
        policy.convert_id(Some(&Value::from("42"))).unwrap(),
        Some(Value::Int(42))
    );
}

#[test]
fn form_submission_for_many_addresses() {
    let config = NestedOptionsConfig::from_json_str(
        r#"{"allow_destroy": true, "reject_if": "all_blank", "limit": 5}"#,
    )
    .unwrap();
    let policy = policy(
        RelationMetadata::many("addresses", TargetModel::with_object_ids("Address")),
        NestedOptions::from_config(&config),
    );

    let home = ObjectId::new();
    let work = ObjectId::new();
    let existing = vec![
        Address {
            id: Value::ObjectId(home),
            street: "Elm".to_string(),
        },
        Address {
            id: Value::ObjectId(work),
            street: "Oak".to_string(),
        },
    ];

    let form = json!([
        {"_id": home.to_hex(), "street": "Birch"},
        {"_id": work.to_hex(), "_destroy": "true"},
        {"street": "", "city": null},
        {"street": "Pine"},
    ]);
    let payloads = form
        .as_array()
        .unwrap()
        .iter()
        .cloned()
        .map(|p| attributes_from_json(p).unwrap())
        .collect();

    let decisions = reconcile_many(&policy, payloads, &existing).unwrap();
    let kinds: Vec<_> = decisions.iter().map(Decision::kind).collect();
    assert_eq!(kinds, vec!["update", "destroy", "skip", "create"]);
    assert_eq!(decisions[2], Decision::Skip { reason: SkipReason::Rejected });

    let Decision::Update { id, attributes } = &decisions[0] else {
        panic!("expected update");
    };
    assert_eq!(*id, Value::ObjectId(home));
    assert_eq!(attributes.get("street"), Some(&Value::from("Birch")));
    assert_ne!(existing[0].street, "Birch");
}

#[test]
fn malformed_object_id_surfaces_to_caller() {
    let policy = policy(
        RelationMetadata::many("addresses", TargetModel::with_object_ids("Address")),
        NestedOptions::default(),
    );
    let payload = attributes_from_json(json!({"id": "not-an-object-id"})).unwrap();
    let err = reconcile_many::<Address>(&policy, vec![payload], &[]).unwrap_err();
    assert!(err.is_conversion());
    assert!(err.is_payload_error());
}

#[test]
fn update_only_one_to_one_never_creates() {
    let policy = policy(
        RelationMetadata::one("profile", TargetModel::new("Profile", IdType::Uuid)),
        NestedOptions::new().update_only(true),
    );

    let payload = attributes_from_json(json!({"bio": "hi"})).unwrap();
    let decision = reconcile_one::<Address>(&policy, payload.clone(), None).unwrap();
    assert_eq!(
        decision,
        Decision::Skip {
            reason: SkipReason::UpdateOnlyWithoutExisting
        }
    );

    let current = Address {
        id: Value::Uuid(uuid::Uuid::new_v4()),
        street: String::new(),
    };
    let decision = reconcile_one(&policy, payload, Some(&current)).unwrap();
    assert!(matches!(decision, Decision::Update { .. }));
}

#[test]
fn shared_policy_across_threads() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let options = NestedOptions::new().with_reject_if(RejectIf::predicate(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        false
    }));
    let policy = policy(
        RelationMetadata::many("addresses", TargetModel::new("Address", IdType::Int)),
        options,
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let policy = policy.clone();
            thread::spawn(move || {
                let payload = attributes_from_json(json!({"street": format!("No. {i}")})).unwrap();
                reconcile_many::<Address>(&policy, vec![payload], &[]).unwrap()
            })
        })
        .collect();

    for handle in handles {
        let decisions = handle.join().unwrap();
        assert!(matches!(decisions[0], Decision::Create { .. }));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}
