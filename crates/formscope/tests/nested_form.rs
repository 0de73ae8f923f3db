//! End-to-end exercise of the scope hierarchy plus property checks for
//! the engine's core guarantees.

use std::cell::RefCell;
use std::rc::Rc;

use formscope::{validators, BoundField, Field, FieldGroup, FieldGroupList, Form, Validator, Verdict};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn required_text(name: &str) -> Field {
    Field::new(name)
        .validator(validators::is_string())
        .validator(validators::required())
}

#[test]
fn signup_form_end_to_end() {
    let form = Form::new(json!({
        "user": { "firstName": "", "lastName": "" },
        "users": [
            { "firstName": "", "lastName": "" },
            { "firstName": "", "lastName": "" },
        ],
    }));
    let changes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&changes);
    form.on_change(move |tree| sink.borrow_mut().push(tree.clone()));

    // A group of two required text fields.
    let user = FieldGroup::new(form.handle(), "user", Vec::new());
    let first_name = BoundField::new(user.handle(), required_text("firstName"));
    let last_name = BoundField::new(user.handle(), required_text("lastName"));

    assert_eq!(first_name.errors(), ["Must not be empty."]);
    assert_eq!(last_name.errors(), ["Must not be empty."]);

    first_name.set(json!("Ada")).unwrap();
    last_name.set(json!("Lovelace")).unwrap();
    assert!(first_name.errors().is_empty());
    assert_eq!(
        form.value()["user"],
        json!({ "firstName": "Ada", "lastName": "Lovelace" })
    );

    // A keyed list of user groups with a cardinality check on the list.
    let users = FieldGroupList::new(
        form.handle(),
        "users",
        |_, index| index.to_string(),
        vec![validators::min_length(1)],
    );
    assert!(users.own_errors().is_empty());

    // Edit the second element through its own nested group.
    let second = FieldGroup::new(users.handle(), "1", Vec::new());
    let second_first_name = BoundField::new(second.handle(), required_text("firstName"));
    assert_eq!(second_first_name.errors(), ["Must not be empty."]);

    second_first_name.set(json!("Grace")).unwrap();
    assert_eq!(
        form.value()["users"],
        json!([
            { "firstName": "", "lastName": "" },
            { "firstName": "Grace", "lastName": "" },
        ])
    );
    assert!(second_first_name.errors().is_empty());

    // Remove every element: the cardinality check now fails.
    users.set_items(Vec::new()).unwrap();
    assert_eq!(users.own_errors(), ["Must be at least 1 in length."]);

    // A write aimed at the removed element is silently dropped.
    second.set_child_value("firstName", json!("late")).unwrap();
    assert_eq!(form.value()["users"], json!([]));

    // Every accepted write reached the change callback with a full tree.
    let changes = changes.borrow();
    assert_eq!(changes.len(), 4);
    assert_eq!(
        changes.last().unwrap()["users"],
        json!([]),
        "callback saw the final tree"
    );
    for tree in changes.iter() {
        assert!(tree.get("user").is_some() && tree.get("users").is_some());
    }
}

#[test]
fn add_and_remove_flow_keeps_error_attribution() {
    let form = Form::new(json!({ "users": [] }));
    let users = FieldGroupList::new(
        form.handle(),
        "users",
        |item, _| item["id"].to_string(),
        vec![validators::min_length(1)],
    );
    assert_eq!(users.own_errors(), ["Must be at least 1 in length."]);

    users
        .set_items(vec![json!({ "id": 7, "name": "" })])
        .unwrap();
    assert!(users.own_errors().is_empty());

    // Child addressed by the derived key, not the position.
    let name_of = |item: &Value| item["name"].as_str().map(str::to_owned);
    let _guard = users.register(Field::new("7").validator(Validator::new(
        "name must not be empty",
        move |item, _| match item.get("name").and_then(Value::as_str) {
            Some("") => Verdict::Fail,
            Some(_) => Verdict::Pass,
            None => Verdict::NotApplicable,
        },
    )));
    assert_eq!(users.child_errors("7"), ["name must not be empty"]);

    // Insert another element in front; the key still finds the right one.
    let mut items = vec![json!({ "id": 3, "name": "first" })];
    items.extend(users.items());
    users.set_items(items).unwrap();
    users
        .set_child_value("7", json!({ "id": 7, "name": "second" }))
        .unwrap();
    assert_eq!(
        form.value()["users"],
        json!([{ "id": 3, "name": "first" }, { "id": 7, "name": "second" }])
    );
    assert!(users.child_errors("7").is_empty());
    assert_eq!(
        name_of(&users.items()[1]).as_deref(),
        Some("second"),
        "write landed on the keyed element"
    );
}

#[test]
fn registration_symmetry_across_scope_kinds() {
    let form = Form::new(json!({ "user": {}, "rows": [] }));
    let group = FieldGroup::new(form.handle(), "user", Vec::new());
    let list = FieldGroupList::new(form.handle(), "rows", |_, i| i.to_string(), Vec::new());

    let before_form = form.errors();
    let before_group = group.errors();
    let before_list = list.errors();

    {
        let _a = form.register(Field::new("x").validator(validators::required()));
        let _b = group.register(Field::new("y").validator(validators::required()));
        let _c = list.register(Field::new("0").validator(validators::required()));
        assert_eq!(form.errors().len(), before_form.len() + 1);
        assert_eq!(group.errors().len(), before_group.len() + 1);
        assert_eq!(list.errors().len(), before_list.len() + 1);
    }

    assert_eq!(form.errors(), before_form);
    assert_eq!(group.errors(), before_group);
    assert_eq!(list.errors(), before_list);
}

proptest! {
    #[test]
    fn merge_locality(
        entries in prop::collection::btree_map("[a-z]{1,4}", any::<i64>(), 1..6),
        pick in any::<prop::sample::Index>(),
        new_value in any::<i64>(),
    ) {
        let obj: Map<String, Value> = entries
            .iter()
            .map(|(k, v)| (k.clone(), json!(v)))
            .collect();
        let keys: Vec<&String> = entries.keys().collect();
        let target = keys[pick.index(keys.len())].clone();

        let form = Form::new(Value::Object(obj.clone()));
        form.set_child_value(&target, json!(new_value)).unwrap();

        let after = form.value();
        prop_assert_eq!(after.get(&target), Some(&json!(new_value)));
        for (k, v) in &obj {
            if *k != target {
                prop_assert_eq!(after.get(k), Some(v), "sibling key {} must be untouched", k);
            }
        }
    }

    #[test]
    fn validation_is_idempotent(
        entries in prop::collection::btree_map("[a-z]{1,4}", "[a-z]{0,3}", 1..6),
    ) {
        let obj: Map<String, Value> = entries
            .iter()
            .map(|(k, v)| (k.clone(), json!(v)))
            .collect();
        let form = Form::new(Value::Object(obj));
        let _guards: Vec<_> = entries
            .keys()
            .map(|k| {
                form.register(
                    Field::new(k.clone())
                        .validator(validators::required())
                        .validator(validators::min_length(2)),
                )
            })
            .collect();
        prop_assert_eq!(form.errors(), form.errors());
    }
}
