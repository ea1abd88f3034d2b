use dfql::filter::{DisplayFilter, FunctionError, FunctionTable, ParserError};
use dfql::{Value, record_from_serialize, records_from_rows};
use serde::Serialize;
use serde_json::{Value as Json, json};

fn matrix() -> Vec<Json> {
    vec![
        json!({"name": "Morpheus", "age": 38, "gender": "male", "killed": false}),
        json!({"name": "Neo", "age": 35, "gender": "male", "killed": false, "power": ["flight", "bullet-time"]}),
        json!({"name": "Cipher", "age": 48, "gender": "male", "killed": true}),
        json!({"name": "Trinity", "age": 32, "gender": "female", "killed": false}),
    ]
}

fn count_with(filter: &DisplayFilter, data: &[Json], text: &str) -> usize {
    filter
        .filter(text, data)
        .unwrap_or_else(|err| panic!("{text}: {err}"))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|err| panic!("{text}: {err}"))
        .len()
}

fn count(data: &[Json], text: &str) -> usize {
    count_with(&DisplayFilter::new(), data, text)
}

fn check(data: &[Json], cases: &[(&str, usize)]) {
    for (text, expected) in cases {
        assert_eq!(count(data, text), *expected, "filter: {text}");
    }
}

#[test]
fn test_empty_filter_returns_all_items() {
    let data = matrix();
    for text in ["", " "] {
        assert_eq!(count(&data, text), data.len());
    }
}

#[test]
fn test_matrix_filters() {
    check(
        &matrix(),
        &[
            ("name", 4),
            ("power", 1),
            ("not power", 3),
            ("name == Neo", 1),
            ("name == \x4e\x65\x6f", 1),
            (r"name == \x4e\x65\x6f", 1),
            ("killed == True", 1),
            ("gender == male", 3),
            ("age == 32", 1),
            ("age >= 32", 4),
            ("age > 32", 3),
            ("age <= 32", 1),
            ("age <= 040", 1),
            ("age <= 0x20", 1),
            ("age < 32", 0),
            ("age ~= 3", 3),
            ("age ~ 3", 3),
            ("age & 0x20", 4),
            ("age in { 32, 35, 38 }", 3),
            ("age in { 30..40 }", 3),
            ("age in { 30-40 }", 3),
            ("age in { 30.0..40.0 }", 3),
            ("name in { \"Neo\", \"Trinity\" }", 2),
            ("age >= 32 and gender == male", 3),
            ("name == Neo or name == Trinity", 2),
            ("gender == female xor power", 2),
            ("gender == male and (age > 30 and age < 40)", 2),
            ("gender == male and not (age > 35)", 1),
            ("gender == male and !(age > 35)", 1),
            ("len(name) == 3", 1),
            ("upper(name) == NEO", 1),
            ("lower(name) == neo", 1),
            ("gender[0] == m", 3),
            ("gender[-1] == e", 4),
            ("gender[0:2] == ma", 3),
            ("gender[:2] == ma", 3),
            ("gender[2:] == le", 3),
            ("gender[1-2] == ma", 3),
            ("gender[0,1] == ma", 3),
            ("gender[:2,3-4] == male", 3),
        ],
    );
}

#[test]
fn test_not_inverts_every_comparison() {
    let data = matrix();
    for text in [
        "power",
        "name == Neo",
        "age > 35",
        "age <= 0x20",
        "name ~= i",
        "name ~ '^T'",
        "age in {30..40}",
        "age & 0x20",
        "len(name) == 3",
        "gender == male and killed == False",
        "name == Neo or age > 40",
    ] {
        let negated = format!("not ({text})");
        assert_eq!(
            count(&data, text) + count(&data, &negated),
            data.len(),
            "filter: {text}"
        );
    }
}

#[test]
fn test_connective_precedence() {
    let data = matrix();
    assert_eq!(count(&data, "name == Neo or name == Trinity and age > 100"), 1);
    assert_eq!(count(&data, "name == Neo or (name == Trinity and age > 100)"), 1);
    assert_eq!(count(&data, "(name == Neo or name == Trinity) and age > 100"), 0);
    assert_eq!(count(&data, "age > 100 and name == Neo or name == Trinity"), 1);
    assert_eq!(count(&data, "name == Neo or name == Neo ^ name == Neo"), 1);
    assert_eq!(count(&data, "name == Neo and name == Neo xor name == Neo"), 0);
    assert_eq!(count(&data, "power ^^ killed == False"), 2);
}

#[test]
fn test_dates() {
    let data = vec![
        json!({"title": "Matrix", "published": "1999/06/17"}),
        json!({"title": "Matrix Revolutions", "published": "2003/05/11"}),
        json!({"title": "Matrix Reloaded", "published": "2003/05/22"}),
        json!({"title": "Matrix Resurrections", "published": "2021/12/23"}),
    ];
    check(
        &data,
        &[
            ("published > 2000", 3),
            ("published < 2000", 1),
            ("published <= 2003/05/11", 2),
            ("published <= 2003-05-11", 2),
        ],
    );
}

#[test]
fn test_nested_and_listed_values() {
    let nested = vec![
        json!({"name": "Morpheus", "age": {"born": "1961"}, "gender": "male"}),
        json!({"name": "Neo", "age": {"born": "1964"}, "gender": "male"}),
        json!({"name": "Cipher", "age": {"born": "1951"}, "gender": "male"}),
        json!({"name": "Trinity", "age": {"born": "1967"}, "gender": "female"}),
    ];
    check(
        &nested,
        &[
            ("age.born > 1960", 3),
            ("age.born > 1960 and age.born < 1970", 3),
            ("age.died", 0),
        ],
    );

    let listed = vec![
        json!({"name": ["Laurence", "Fishburne"], "gender": "male"}),
        json!({"name": ["Keanu", "Reeves"], "gender": "male"}),
        json!({"name": ["Joe", "Pantoliano"], "gender": "male"}),
        json!({"name": ["Carrie-Anne", "Moss"], "gender": "female"}),
    ];
    check(
        &listed,
        &[("name == Keanu", 1), ("name ~= u", 2), ("name ~ .*e$", 3)],
    );
}

#[test]
fn test_network_values() {
    let data = vec![
        json!({"ipv4": "10.2.2.2", "ipv6": "2001:db8:0:0:0:0:1428:57ab", "mac": "00:83:00:20:20:83", "ports": [22]}),
        json!({"ipv4": "192.168.0.1", "ipv6": "2001:0db8:0000:08d3:0000:8a2e:0070:7344", "mac": "00:83:00:20:20:83", "ports": []}),
    ];
    check(
        &data,
        &[
            ("ipv4 == 10.2.2.2", 1),
            ("ipv4 in { 10.2.2.2/24 }", 1),
            ("ipv4 in { 10.*.*.*, 192.168.0-1.1 }", 2),
            ("mac[0] == 00", 2),
            ("mac[:2] == 00:83", 2),
            ("mac[1-2] == 00:83", 2),
            ("mac[1-2,1-2] == 00:83:00:83", 2),
            ("ipv4[0] == 10", 1),
            ("ipv4[0:2] == 10.2", 1),
            ("ipv4[:2] == 10.2", 1),
            ("ipv4[1-2] == 10.2", 1),
            ("ipv4[0,1] == 10.2", 1),
            ("ipv4[1-2,1-2] == 10.2.10.2", 1),
            (
                "ipv6 == 2001:0db8:0000:08d3:0000:8a2e:0070:7344 and ipv6 == 2001:db8:0:8d3:0:8a2e:70:7344",
                1,
            ),
            ("ipv6 == 2001:db8:0:0:0:0:1428:57ab and ipv6 == 2001:db8::1428:57ab", 1),
            ("ipv6[0] == 2001", 2),
            ("ipv6[:2] == 2001:0db8", 2),
            ("ipv6[1-2] == 2001:0db8", 2),
            ("ipv6[1-2,1-2] == 2001:0db8:2001:0db8", 2),
            ("ports", 1),
            ("ports == 22", 1),
        ],
    );
}

fn mixed() -> Vec<Json> {
    vec![
        json!({"n/a": "n/a"}),
        json!({"value": ""}),
        json!({"value": "0"}),
        json!({"value": 0}),
        json!({"value": "0.0"}),
        json!({"value": 0.0}),
        json!({"value": "0j"}),
        json!({"value": "-1"}),
        json!({"value": -1}),
        json!({"value": "-1.0"}),
        json!({"value": -1.0}),
        json!({"value": 1}),
        json!({"value": "1"}),
        json!({"value": 1.0}),
        json!({"value": "1.0"}),
        json!({"value": 1.5}),
        json!({"value": "1.5"}),
        json!({"value": 2.5}),
        json!({"value": "2.5"}),
        json!({"value": "abcd"}),
        json!({"value": "1999/06/17"}),
        json!({"value": "10.2.2.2"}),
        json!({"value": "2001:db8:0:0:0:0:1428:57ab"}),
        json!({"value": "00:83:00:20:20:83"}),
        json!({"value": [-1, 1, "1.5", 2.5, "a"]}),
        json!({"value": ["a", "b"]}),
        json!({"value": []}),
        json!({"value": {"x": "y"}}),
        json!({"value": {}}),
        json!({"value": true}),
        json!({"value": "True"}),
        json!({"value": false}),
        json!({"value": "False"}),
    ]
}

#[test]
fn test_mixed_types() {
    let data = mixed();
    let n = data.len();
    check(
        &data,
        &[
            ("value", n - 4),
            ("not value", 4),
            ("value == 1", 5),
            ("value != 1", n - 5),
            ("value == 1.0", 5),
            ("value != 1.0", n - 5),
            ("value == 0", 4),
            ("value != 0", n - 4),
            ("value == -1", 5),
            ("value != -1", n - 5),
            ("value == 1.5", 3),
            ("value != 1.5", n - 3),
            ("value == 2.5", 3),
            ("value != 2.5", n - 3),
            ("value == ''", 1),
            ("value != ''", n - 1),
            ("value == abcd", 1),
            ("value != abcd", n - 1),
            ("value >= abcd", 0),
            ("value <= abcd", 0),
            ("value > abcd", 0),
            ("value < abcd", 0),
            ("value == 1999/06/17", 1),
            ("value != 1999/06/17", n - 1),
            ("value == 10.2.2.2", 1),
            ("value != 10.2.2.2", n - 1),
            ("value >= 10.2.2.2", 1),
            ("value <= 10.2.2.2", 1),
            ("value > 10.2.2.2", 0),
            ("value < 10.2.2.2", 0),
            ("value == 2001:db8:0:0:0:0:1428:57ab", 1),
            ("value != 2001:db8:0:0:0:0:1428:57ab", n - 1),
            ("value >= 2001:db8:0:0:0:0:1428:57ab", 1),
            ("value <= 2001:db8:0:0:0:0:1428:57ab", 1),
            ("value > 2001:db8:0:0:0:0:1428:57ab", 0),
            ("value < 2001:db8:0:0:0:0:1428:57ab", 0),
            ("value == True", 2),
            ("value != True", n - 2),
            ("value == False", 2),
            ("value != False", n - 2),
            ("value > True", 0),
            ("value < True", 0),
            ("value <= True", 0),
            ("value >= True", 0),
            ("value > False", 0),
            ("value < False", 0),
            ("value <= False", 0),
            ("value >= False", 0),
            ("value == 00:83:00:20:20:83", 1),
            ("value != 00:83:00:20:20:83", n - 1),
            ("value <= 00:83:00:20:20:83", 0),
            ("value >= 00:83:00:20:20:83", 0),
            ("value < 00:83:00:20:20:83", 0),
            ("value > 00:83:00:20:20:83", 0),
        ],
    );
}

#[test]
fn test_default_functions() {
    let data = vec![
        json!({"value": "foobar"}),
        json!({"value": "FOOBAR"}),
        json!({"value": "FOO"}),
        json!({"value": "BAR"}),
    ];
    check(
        &data,
        &[
            ("lower(value) == foobar", 2),
            ("upper(value) == FOOBAR", 2),
            ("upper(value) ~= FOO", 3),
            ("lower(value) ~= foo", 3),
            ("len(value) == 6", 2),
            ("len(value) == 3", 2),
        ],
    );
    for text in ["ltrim(value) == foobar", "rtrim(value) == foobar", "trim(value) == foobar"] {
        assert!(matches!(
            DisplayFilter::new().filter(text, &data),
            Err(ParserError::UnknownFunction { .. })
        ));
    }
}

#[test]
fn test_custom_functions() {
    let data = vec![
        json!({"value": " foobar"}),
        json!({"value": " foobar "}),
        json!({"value": "foobar "}),
    ];
    let strip = |f: fn(&str) -> &str| {
        move |value: &Value| match value {
            Value::String(s) => Ok(Value::from(f(s))),
            other => Err(FunctionError(format!("cannot strip {}", other.kind()))),
        }
    };
    let functions = FunctionTable::empty()
        .with("ltrim", strip(str::trim_start))
        .with("rtrim", strip(str::trim_end))
        .with("trim", strip(str::trim));
    let filter = DisplayFilter::new().with_functions(functions);
    for (text, expected) in [
        ("value == foobar", 0),
        ("ltrim(value) == foobar", 1),
        ("rtrim(value) == foobar", 1),
        ("trim(value) == foobar", 3),
    ] {
        assert_eq!(count_with(&filter, &data, text), expected, "{text}");
    }
    assert!(filter.parse("len(value) == 6").is_err());
}

#[test]
fn test_builtin_catalogue() {
    let data = vec![json!({"value": " foobar"}), json!({"value": "foobar "})];
    let filter = DisplayFilter::new()
        .with_functions(FunctionTable::builtins(&["trim", "ltrim", "rtrim"]).unwrap());
    assert_eq!(count_with(&filter, &data, "trim(value) == foobar"), 2);
    assert_eq!(count_with(&filter, &data, "ltrim(value) == foobar"), 1);
    assert!(FunctionTable::builtins(&["reverse"]).is_err());
}

#[test]
fn test_function_type_errors_skip_records() {
    let data = vec![json!({"value": 12}), json!({"value": "ab"})];
    assert_eq!(count(&data, "upper(value) == AB"), 1);
    assert_eq!(count(&data, "len(missing) == 0"), 0);
}

#[test]
fn test_allow_list() {
    let data = matrix();
    let filter = DisplayFilter::new().with_field_names(["name", "age"]);
    assert_eq!(count_with(&filter, &data, "name == Neo"), 1);
    assert!(matches!(
        filter.filter("gender == male", &data),
        Err(ParserError::UnknownField { field, .. }) if field == "gender"
    ));
}

#[test]
fn test_row_records() {
    let rows = vec![
        vec![Value::from("Neo"), Value::from(35_i64)],
        vec![Value::from("Trinity"), Value::from(32_i64)],
        vec![Value::from("Cipher")],
    ];
    let records = records_from_rows(&["name", "age"], rows);
    let filter = DisplayFilter::new();
    let matches: Vec<&Value> = filter
        .filter("age < 34 or not age", &records)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(matches, vec![&records[1], &records[2]]);
}

#[derive(Serialize)]
struct Character {
    name: String,
    age: i64,
    crew: Crew,
}

#[derive(Serialize)]
struct Crew {
    ship: String,
}

#[test]
fn test_object_records() {
    let records: Vec<Value> = [("Neo", 35, "Nebuchadnezzar"), ("Niobe", 40, "Logos")]
        .into_iter()
        .map(|(name, age, ship)| {
            record_from_serialize(&Character {
                name: name.to_string(),
                age,
                crew: Crew {
                    ship: ship.to_string(),
                },
            })
            .unwrap()
        })
        .collect();
    let filter = DisplayFilter::new();
    let tree = filter.parse("crew.ship == Logos and age > 30").unwrap();
    let matches: Vec<_> = filter.apply(&tree, &records).collect::<Result<_, _>>().unwrap();
    assert_eq!(matches, vec![&records[1]]);
}

#[test]
fn test_filtering_is_lazy_and_ordered() {
    let data: Vec<Json> = (0..1000).map(|i| json!({"n": i})).collect();
    let filter = DisplayFilter::new();
    let first: Vec<_> = filter
        .filter("n & 1", &data)
        .unwrap()
        .take(3)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(first, vec![&data[1], &data[3], &data[5]]);
}
