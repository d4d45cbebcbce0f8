use deepcmp_core::model::Value;

/// A person record with a name, an age and an address
#[allow(dead_code)]
pub fn person(name: &str, age: i64, city: &str) -> Value {
    Value::object(
        "Person",
        [
            ("name", Value::from(name)),
            ("age", Value::from(age)),
            ("address", address(city)),
        ],
    )
}

#[allow(dead_code)]
pub fn address(city: &str) -> Value {
    Value::object(
        "Address",
        [("city", Value::from(city)), ("zip", Value::from("00000"))],
    )
}

/// An order with one line per sku, each of quantity 1
#[allow(dead_code)]
pub fn order(id: &str, skus: &[&str]) -> Value {
    let lines = Value::list(skus.iter().map(|sku| {
        Value::object("Line", [("sku", Value::from(*sku)), ("qty", Value::from(1))])
    }));
    Value::object("Order", [("id", Value::from(id)), ("lines", lines)])
}

/// A node whose `next` field points back at itself
#[allow(dead_code)]
pub fn self_loop(name: &str) -> Value {
    let node = Value::object("Node", [("name", Value::from(name))]);
    node.set_field("next", node.clone()).unwrap();
    node
}

/// Two nodes pointing at each other; returns the first
#[allow(dead_code)]
pub fn mutual_pair(first: &str, second: &str) -> Value {
    let a = Value::object("Node", [("name", Value::from(first))]);
    let b = Value::object("Node", [("name", Value::from(second))]);
    a.set_field("next", b.clone()).unwrap();
    b.set_field("next", a.clone()).unwrap();
    a
}
