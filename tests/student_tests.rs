use serde_json::json;
use table_query::{Expr, Query, Value};

fn students() -> Vec<serde_json::Value> {
    vec![
        json!({"first_name": "Terry",    "last_name": "Adams",       "id": 120, "year": 2, "exam_scores": [99, 82, 81, 79]}),
        json!({"first_name": "Fadi",     "last_name": "Fakhouri",    "id": 116, "year": 3, "exam_scores": [99, 86, 90, 94]}),
        json!({"first_name": "Hanying",  "last_name": "Feng",        "id": 117, "year": 1, "exam_scores": [93, 92, 80, 87]}),
        json!({"first_name": "Cesar",    "last_name": "Garcia",      "id": 114, "year": 4, "exam_scores": [97, 89, 85, 82]}),
        json!({"first_name": "Debra",    "last_name": "Garcia",      "id": 115, "year": 3, "exam_scores": [35, 72, 91, 70]}),
        json!({"first_name": "Hugo",     "last_name": "Garcia",      "id": 118, "year": 2, "exam_scores": [92, 90, 83, 78]}),
        json!({"first_name": "Sven",     "last_name": "Mortensen",   "id": 113, "year": 1, "exam_scores": [88, 94, 65, 91]}),
        json!({"first_name": "Claire",   "last_name": "O'Donnell",   "id": 112, "year": 4, "exam_scores": [75, 84, 91, 39]}),
        json!({"first_name": "Svetlana", "last_name": "Omelchenko",  "id": 111, "year": 2, "exam_scores": [97, 92, 81, 60]}),
        json!({"first_name": "Lance",    "last_name": "Tucker",      "id": 119, "year": 3, "exam_scores": [68, 79, 88, 92]}),
        json!({"first_name": "Michael",  "last_name": "Tucker",      "id": 122, "year": 1, "exam_scores": [94, 92, 91, 91]}),
        json!({"first_name": "Eugene",   "last_name": "Zabokritski", "id": 121, "year": 4, "exam_scores": [96, 85, 91, 60]}),
    ]
}

fn high_scores(exam: i64, score: i64) -> Query {
    table_query::from("student", students())
        .filter(|student| student.field("exam_scores").at(exam).gt(score))
        .unwrap()
        .project(|student| {
            Expr::record([
                ("name", student.field("first_name")),
                ("score", student.field("exam_scores").at(exam)),
            ])
        })
        .unwrap()
}

fn summarize(rows: &[Value]) -> String {
    rows.iter()
        .map(|row| {
            let record = row.as_record().unwrap();
            format!(
                "{}:{}",
                record.get("name").unwrap().as_str().unwrap(),
                record.get("score").unwrap()
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn test_high_scores_on_second_exam() {
    let rows = high_scores(1, 90).to_vec().unwrap();
    assert_eq!(summarize(&rows), "Hanying:92 Sven:94 Svetlana:92 Michael:92");
}

#[test]
fn test_high_scores_query_is_reusable_with_other_parameters() {
    let rows = high_scores(3, 90).to_vec().unwrap();
    assert_eq!(summarize(&rows), "Fadi:94 Sven:91 Lance:92 Michael:91");
}

#[test]
fn test_projected_records_keep_declared_key_order() {
    let rows = high_scores(1, 93).to_vec().unwrap();
    assert_eq!(rows.len(), 1);

    let keys: Vec<&str> = rows[0].as_record().unwrap().keys().collect();
    assert_eq!(keys, vec!["name", "score"]);
    assert_eq!(rows[0].to_string(), r#"{"name":"Sven","score":94}"#);
}

#[test]
fn test_projection_round_trips_to_json() {
    let rows = high_scores(1, 93).to_vec().unwrap();
    let json: Vec<serde_json::Value> = rows.into_iter().map(serde_json::Value::from).collect();
    assert_eq!(json, vec![json!({"name": "Sven", "score": 94})]);
}

#[test]
fn test_group_students_by_year() {
    let groups = table_query::from("student", students())
        .group_by(|student| student.field("year"))
        .unwrap()
        .to_groups()
        .unwrap();

    let years: Vec<&Value> = groups.keys().collect();
    assert_eq!(
        years,
        vec![&Value::from(2), &Value::from(3), &Value::from(1), &Value::from(4)]
    );

    let first_years: Vec<&str> = groups
        .get(&Value::from(1))
        .unwrap()
        .iter()
        .map(|s| s.as_record().unwrap().get("first_name").unwrap().as_str().unwrap())
        .collect();
    assert_eq!(first_years, vec!["Hanying", "Sven", "Michael"]);
}

#[test]
fn test_average_projection_with_methods() {
    let query = table_query::from("student", students())
        .filter(|student| student.field("last_name").equals("Garcia"))
        .unwrap()
        .project(|student| {
            Expr::record([
                ("name", student.field("first_name")),
                ("total", student.field("exam_scores").call("sum", Vec::<Expr>::new())),
                ("best", student.field("exam_scores").call("max", Vec::<Expr>::new())),
            ])
        })
        .unwrap();

    let rendered: Vec<String> = query
        .to_vec()
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        rendered,
        vec![
            r#"{"name":"Cesar","total":353,"best":97}"#,
            r#"{"name":"Debra","total":268,"best":91}"#,
            r#"{"name":"Hugo","total":343,"best":92}"#,
        ]
    );
}

#[test]
fn test_compound_predicate() {
    let query = table_query::from("student", students())
        .filter(|student| {
            student
                .field("year")
                .equals(4)
                .and(student.field("exam_scores").at(-1).lt(70))
        })
        .unwrap()
        .project(|student| student.field("last_name"))
        .unwrap();

    assert_eq!(
        query.to_vec().unwrap(),
        vec![Value::from("O'Donnell"), Value::from("Zabokritski")]
    );
}

#[test]
fn test_missing_field_is_unsupported() {
    let query = table_query::from("student", students())
        .project(|student| student.field("middle_name"))
        .unwrap();

    assert_eq!(
        query.to_vec(),
        Err(table_query::EvalError::UnsupportedOperation {
            operation: "middle_name".to_string(),
            receiver: "record",
        })
    );
}
