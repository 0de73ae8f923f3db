//! A console walkthrough of the engine: the nested user/users form, driven
//! programmatically the way a widget layer would drive it.
//!
//! Run with `cargo run --example signup`.

use formscope::{validators, BoundField, Field, FieldGroup, FieldGroupList, Form};
use serde_json::json;

fn required_text(name: &str) -> Field {
    Field::new(name)
        .validator(validators::is_string())
        .validator(validators::required())
}

fn print_errors(label: &str, errors: &[String]) {
    if errors.is_empty() {
        println!("  {label}: ok");
    } else {
        println!("  {label}: {}", errors.join(" / "));
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let form = Form::new(json!({
        "user": { "firstName": "", "lastName": "" },
        "users": [
            { "firstName": "", "lastName": "" },
            { "firstName": "", "lastName": "" },
        ],
    }));
    form.on_change(|tree| println!("tree changed: {tree}"));

    let user = FieldGroup::new(form.handle(), "user", Vec::new());
    let first_name = BoundField::new(user.handle(), required_text("firstName"));
    let last_name = BoundField::new(user.handle(), required_text("lastName"));

    let users = FieldGroupList::new(
        form.handle(),
        "users",
        |_, index| index.to_string(),
        vec![validators::min_length(1)],
    );

    println!("initial state:");
    print_errors("user.firstName", &first_name.errors());
    print_errors("user.lastName", &last_name.errors());
    print_errors("users", &users.own_errors());

    println!("\nfilling in the user...");
    first_name.set(json!("Ada")).unwrap();
    last_name.set(json!("Lovelace")).unwrap();
    print_errors("user.firstName", &first_name.errors());
    print_errors("user.lastName", &last_name.errors());

    println!("\nediting the second list entry through its own group...");
    let second = FieldGroup::new(users.handle(), "1", Vec::new());
    let second_first = BoundField::new(second.handle(), required_text("firstName"));
    second_first.set(json!("Grace")).unwrap();
    print_errors("users[1].firstName", &second_first.errors());

    println!("\nremoving all users...");
    users.set_items(Vec::new()).unwrap();
    print_errors("users", &users.own_errors());

    println!("\nadding one back...");
    users
        .set_items(vec![json!({ "firstName": "Edsger", "lastName": "Dijkstra" })])
        .unwrap();
    print_errors("users", &users.own_errors());

    println!("\nfinal tree: {}", form.value());
}
