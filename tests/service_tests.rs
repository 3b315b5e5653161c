use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

mod common;
use common::TestApp;

fn categories_path(business_id: Uuid) -> String {
    format!("/businesses/{business_id}/categories")
}

async fn create_category(
    app: &TestApp,
    business_id: Uuid,
    name: &str,
    category_type: &str,
    parent_id: Option<&str>,
) -> Value {
    let payload = json!({
        "name": name,
        "categoryType": category_type,
        "parentId": parent_id,
    });

    let response = app
        .post(&categories_path(business_id), Some(&app.token()), &payload)
        .await;
    assert_eq!(response.status(), 201, "creating {name}");
    response.json()
}

async fn list_expenses(app: &TestApp, business_id: Uuid) -> Value {
    let path = format!("{}?type=expense", categories_path(business_id));
    let response = app.get(&path, Some(&app.token())).await;
    assert_eq!(response.status(), 200);
    response.json()
}

fn top_level_names(list: &Value) -> Vec<String> {
    list["tree"]
        .as_array()
        .unwrap()
        .iter()
        .map(|node| node["name"].as_str().unwrap().to_string())
        .collect()
}

fn id_of(category: &Value) -> &str {
    category["id"].as_str().unwrap()
}

#[actix_rt::test]
async fn test_health_with_database() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };

    let response = app.get("/health", None).await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.json()["database"], "connected");
}

#[actix_rt::test]
async fn test_create_appends_after_siblings() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let business_id = app.seed_business().await;

    let ingredients = create_category(&app, business_id, "Ingredients", "expense", None).await;
    let packaging = create_category(&app, business_id, "Packaging", "expense", None).await;
    let salary = create_category(&app, business_id, "Sales", "income", None).await;
    let flour = create_category(
        &app,
        business_id,
        "Flour",
        "expense",
        Some(id_of(&ingredients)),
    )
    .await;
    let sugar = create_category(
        &app,
        business_id,
        "Sugar",
        "expense",
        Some(id_of(&ingredients)),
    )
    .await;

    assert_eq!(ingredients["sortOrder"], 0);
    assert_eq!(packaging["sortOrder"], 1);
    // Income categories form their own sibling group
    assert_eq!(salary["sortOrder"], 0);
    assert_eq!(flour["sortOrder"], 0);
    assert_eq!(sugar["sortOrder"], 1);
    assert_eq!(sugar["parentId"], ingredients["id"]);
}

#[actix_rt::test]
async fn test_create_rejects_subcategory_parent() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let business_id = app.seed_business().await;
    let ingredients = create_category(&app, business_id, "Ingredients", "expense", None).await;
    let flour = create_category(
        &app,
        business_id,
        "Flour",
        "expense",
        Some(id_of(&ingredients)),
    )
    .await;

    let payload = json!({
        "name": "Whole wheat",
        "categoryType": "expense",
        "parentId": flour["id"],
    });
    let response = app
        .post(&categories_path(business_id), Some(&app.token()), &payload)
        .await;

    assert_eq!(response.status(), 400);
    assert_eq!(response.json()["error"], "VALIDATION_ERROR");
}

#[actix_rt::test]
async fn test_create_rejects_parent_of_other_type() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let business_id = app.seed_business().await;
    let sales = create_category(&app, business_id, "Sales", "income", None).await;

    let payload = json!({
        "name": "Boxes",
        "categoryType": "expense",
        "parentId": sales["id"],
    });
    let response = app
        .post(&categories_path(business_id), Some(&app.token()), &payload)
        .await;

    assert_eq!(response.status(), 400);
    let body = response.json();
    assert!(body["message"].as_str().unwrap().contains("same type"));
}

#[actix_rt::test]
async fn test_reorder_persists_changed_placements() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let business_id = app.seed_business().await;
    create_category(&app, business_id, "A", "expense", None).await;
    let b = create_category(&app, business_id, "B", "expense", None).await;
    let c = create_category(&app, business_id, "C", "expense", None).await;

    let payload = json!({
        "draggedId": b["id"],
        "targetId": c["id"],
        "dropIntent": "after",
    });
    let path = format!("{}/reorder", categories_path(business_id));
    let response = app.post(&path, Some(&app.token()), &payload).await;

    assert_eq!(response.status(), 200);
    let body = response.json();
    assert_eq!(body["moved"], true);
    assert_eq!(body["changed"].as_array().unwrap().len(), 2);
    assert_eq!(top_level_names(&body["list"]), vec!["A", "C", "B"]);

    // Reload from the database
    let list = list_expenses(&app, business_id).await;
    assert_eq!(top_level_names(&list), vec!["A", "C", "B"]);
    let orders: Vec<i64> = list["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["sortOrder"].as_i64().unwrap())
        .collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[actix_rt::test]
async fn test_reorder_nests_and_closes_gap() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let business_id = app.seed_business().await;
    let a = create_category(&app, business_id, "A", "expense", None).await;
    let b = create_category(&app, business_id, "B", "expense", None).await;
    create_category(&app, business_id, "C", "expense", None).await;

    let payload = json!({
        "draggedId": a["id"],
        "targetId": b["id"],
        "dropIntent": "inside",
    });
    let path = format!("{}/reorder", categories_path(business_id));
    let response = app.post(&path, Some(&app.token()), &payload).await;
    assert_eq!(response.status(), 200);

    let list = list_expenses(&app, business_id).await;
    assert_eq!(top_level_names(&list), vec!["B", "C"]);
    let b_node = &list["tree"][0];
    assert_eq!(b_node["sortOrder"], 0);
    assert_eq!(b_node["children"][0]["name"], "A");
    assert_eq!(b_node["children"][0]["sortOrder"], 0);
    assert_eq!(list["tree"][1]["sortOrder"], 1);
}

#[actix_rt::test]
async fn test_ignored_move_writes_nothing() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let business_id = app.seed_business().await;
    let a = create_category(&app, business_id, "A", "expense", None).await;
    create_category(&app, business_id, "B", "expense", None).await;
    let before = list_expenses(&app, business_id).await;

    let payload = json!({
        "draggedId": a["id"],
        "targetId": a["id"],
        "dropIntent": "before",
    });
    let path = format!("{}/reorder", categories_path(business_id));
    let response = app.post(&path, Some(&app.token()), &payload).await;

    assert_eq!(response.status(), 200);
    let body = response.json();
    assert_eq!(body["moved"], false);
    assert!(body["changed"].as_array().unwrap().is_empty());

    let after = list_expenses(&app, business_id).await;
    assert_eq!(before["version"], after["version"]);
    assert_eq!(before["categories"], after["categories"]);
}

#[actix_rt::test]
async fn test_reorder_with_stale_version_conflicts() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let business_id = app.seed_business().await;
    create_category(&app, business_id, "A", "expense", None).await;
    let b = create_category(&app, business_id, "B", "expense", None).await;
    let c = create_category(&app, business_id, "C", "expense", None).await;

    let list = list_expenses(&app, business_id).await;
    let version: DateTime<Utc> = list["version"].as_str().unwrap().parse().unwrap();
    let path = format!("{}/reorder", categories_path(business_id));

    let stale = json!({
        "draggedId": b["id"],
        "targetId": c["id"],
        "dropIntent": "after",
        "expectedVersion": version - Duration::seconds(1),
    });
    let response = app.post(&path, Some(&app.token()), &stale).await;
    assert_eq!(response.status(), 409);
    assert_eq!(response.json()["error"], "CONFLICT");

    // Nothing was written by the rejected move
    assert_eq!(
        top_level_names(&list_expenses(&app, business_id).await),
        vec!["A", "B", "C"]
    );

    let current = json!({
        "draggedId": b["id"],
        "targetId": c["id"],
        "dropIntent": "after",
        "expectedVersion": list["version"],
    });
    let response = app.post(&path, Some(&app.token()), &current).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.json()["moved"], true);
}

#[actix_rt::test]
async fn test_reorder_of_other_business_category_not_found() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let business_id = app.seed_business().await;
    let other_business = app.seed_business().await;
    let foreign = create_category(&app, other_business, "Rent", "expense", None).await;

    let payload = json!({ "draggedId": foreign["id"] });
    let path = format!("{}/reorder", categories_path(business_id));
    let response = app.post(&path, Some(&app.token()), &payload).await;

    assert_eq!(response.status(), 404);
}

#[actix_rt::test]
async fn test_member_without_finance_permission_is_forbidden() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let business_id = app.seed_business().await;
    let cashier = Uuid::new_v4();
    app.add_member(business_id, cashier, false).await;
    let token = app.token_for_user(cashier);

    // Reading is allowed
    let path = format!("{}?type=expense", categories_path(business_id));
    assert_eq!(app.get(&path, Some(&token)).await.status(), 200);

    let payload = json!({ "name": "Tips", "categoryType": "income" });
    let response = app
        .post(&categories_path(business_id), Some(&token), &payload)
        .await;

    assert_eq!(response.status(), 403);
    assert_eq!(response.json()["error"], "FORBIDDEN");
}

#[actix_rt::test]
async fn test_non_member_gets_not_found() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let business_id = app.seed_business().await;
    let token = app.token_for_user(Uuid::new_v4());

    let path = format!("{}?type=expense", categories_path(business_id));
    let response = app.get(&path, Some(&token)).await;

    assert_eq!(response.status(), 404);
    assert_eq!(response.json()["error"], "NOT_FOUND");
}

#[actix_rt::test]
async fn test_update_category_permissions_and_lookup() {
    let Some(app) = TestApp::with_database().await else {
        return;
    };
    let business_id = app.seed_business().await;
    let cakes = create_category(&app, business_id, "Cakes", "income", None).await;
    let path = format!("{}/{}", categories_path(business_id), id_of(&cakes));

    let response = app
        .patch(&path, &app.token(), &json!({ "name": "  Cakes & pies " }))
        .await;
    assert_eq!(response.status(), 200);
    let body = response.json();
    assert_eq!(body["name"], "Cakes & pies");
    assert_eq!(body["sortOrder"], cakes["sortOrder"]);

    let cashier = Uuid::new_v4();
    app.add_member(business_id, cashier, false).await;
    let response = app
        .patch(&path, &app.token_for_user(cashier), &json!({ "name": "Pies" }))
        .await;
    assert_eq!(response.status(), 403);

    let missing = format!("{}/{}", categories_path(business_id), Uuid::new_v4());
    let response = app.patch(&missing, &app.token(), &json!({ "name": "Pies" })).await;
    assert_eq!(response.status(), 404);
    assert_eq!(response.json()["error"], "NOT_FOUND");
}
