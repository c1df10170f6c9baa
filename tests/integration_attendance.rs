mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use common::{create_test_student, setup_test_app};
use homeroom::modules::attendance::store::{AttendanceStore, PgAttendanceStore, StoreError};
use homeroom::modules::attendance::{AttendanceReason, AttendanceType, NewAttendanceRecord};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;

async fn post_attendance(pool: &PgPool, payload: Value) -> (StatusCode, Value) {
    let app = setup_test_app(pool.clone());
    let request = Request::builder()
        .method("POST")
        .uri("/api/attendance")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&payload).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn get_json(pool: &PgPool, uri: &str) -> (StatusCode, Value) {
    let app = setup_test_app(pool.clone());
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&body).unwrap())
}

#[sqlx::test(migrations = "./migrations")]
async fn test_record_plain_absence(pool: PgPool) {
    let student_id = create_test_student(&pool, "M").await;

    let (status, body) = post_attendance(
        &pool,
        json!({
            "student_id": student_id,
            "date": "2025-03-10",
            "type": "absent",
            "note": "fever"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["student_id"], student_id);
    assert_eq!(body["date"], "2025-03-10");
    assert_eq!(body["type"], "absent");
    assert_eq!(body["reason"], "NORMAL");
    assert_eq!(body["periods"], 0);
    assert_eq!(body["note"], "fever");
    assert!(body["id"].as_i64().is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_student_is_not_found(pool: PgPool) {
    let (status, body) = post_attendance(
        &pool,
        json!({ "student_id": 999_999, "date": "2025-03-10", "type": "absent" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "student_not_found");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invalid_type_and_reason_are_rejected(pool: PgPool) {
    let student_id = create_test_student(&pool, "F").await;

    let (status, body) = post_attendance(
        &pool,
        json!({ "student_id": student_id, "date": "2025-03-10", "type": "tardy" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_type");

    let (status, body) = post_attendance(
        &pool,
        json!({
            "student_id": student_id,
            "date": "2025-03-10",
            "type": "absent",
            "reason": "VACATION"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_reason");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_malformed_date_is_bad_request(pool: PgPool) {
    let student_id = create_test_student(&pool, "F").await;

    let (status, body) = post_attendance(
        &pool,
        json!({ "student_id": student_id, "date": "2025-02-30", "type": "absent" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_body");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_menstrual_requires_female_student(pool: PgPool) {
    let student_id = create_test_student(&pool, "M").await;

    let (status, body) = post_attendance(
        &pool,
        json!({
            "student_id": student_id,
            "date": "2025-03-10",
            "type": "absent",
            "reason": "MENSTRUAL"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "gender_ineligible");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_menstrual_once_per_month(pool: PgPool) {
    let student_id = create_test_student(&pool, "F").await;

    let (status, _) = post_attendance(
        &pool,
        json!({
            "student_id": student_id,
            "date": "2025-03-10",
            "type": "absent",
            "reason": "MENSTRUAL"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_attendance(
        &pool,
        json!({
            "student_id": student_id,
            "date": "2025-03-20",
            "type": "late",
            "reason": "MENSTRUAL"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "monthly_limit_exceeded");
    assert!(body["error"].as_str().unwrap().contains("2025-03"));

    let (status, _) = post_attendance(
        &pool,
        json!({
            "student_id": student_id,
            "date": "2025-04-01",
            "type": "absent",
            "reason": "MENSTRUAL"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_domestic_quota_counts_distinct_days(pool: PgPool) {
    let student_id = create_test_student(&pool, "M").await;

    for day in 1..=7 {
        let (status, _) = post_attendance(
            &pool,
            json!({
                "student_id": student_id,
                "date": format!("2025-05-{:02}", day),
                "type": "absent",
                "reason": "EXTERNAL_DOMESTIC"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // A second type on an already-counted day does not consume quota.
    let (status, _) = post_attendance(
        &pool,
        json!({
            "student_id": student_id,
            "date": "2025-05-03",
            "type": "late",
            "reason": "EXTERNAL_DOMESTIC"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_attendance(
        &pool,
        json!({
            "student_id": student_id,
            "date": "2025-05-08",
            "type": "absent",
            "reason": "EXTERNAL_DOMESTIC"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "annual_quota_exceeded");

    // Quota resets with the calendar year.
    let (status, _) = post_attendance(
        &pool,
        json!({
            "student_id": student_id,
            "date": "2026-01-05",
            "type": "absent",
            "reason": "EXTERNAL_DOMESTIC"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_type_on_date(pool: PgPool) {
    let student_id = create_test_student(&pool, "F").await;
    let payload = json!({ "student_id": student_id, "date": "2025-03-10", "type": "late" });

    let (status, _) = post_attendance(&pool, payload.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_attendance(&pool, payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "duplicate_type_on_date");

    let (status, _) = post_attendance(
        &pool,
        json!({ "student_id": student_id, "date": "2025-03-10", "type": "early_leave" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_negative_periods_is_unprocessable(pool: PgPool) {
    let student_id = create_test_student(&pool, "M").await;

    let (status, body) = post_attendance(
        &pool,
        json!({
            "student_id": student_id,
            "date": "2025-03-10",
            "type": "period_absence",
            "periods": -2
        }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["kind"], "validation_failed");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_list_is_ordered_and_filtered(pool: PgPool) {
    let student_id = create_test_student(&pool, "M").await;
    let other_id = create_test_student(&pool, "F").await;

    for (date, kind) in [
        ("2025-03-12", "absent"),
        ("2025-03-10", "late"),
        ("2025-03-10", "early_leave"),
        ("2025-04-01", "present"),
    ] {
        let (status, _) = post_attendance(
            &pool,
            json!({ "student_id": student_id, "date": date, "type": kind }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    post_attendance(
        &pool,
        json!({ "student_id": other_id, "date": "2025-03-11", "type": "absent" }),
    )
    .await;

    let (status, body) = get_json(
        &pool,
        &format!(
            "/api/attendance?student_id={}&start=2025-03-01&end=2025-03-31",
            student_id
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let rows: Vec<(String, String)> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            (
                r["date"].as_str().unwrap().to_string(),
                r["type"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            ("2025-03-10".to_string(), "early_leave".to_string()),
            ("2025-03-10".to_string(), "late".to_string()),
            ("2025-03-12".to_string(), "absent".to_string()),
        ]
    );

    let (status, body) =
        get_json(&pool, &format!("/api/attendance?student_id={}", student_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 4);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_summary_reports_usage(pool: PgPool) {
    let student_id = create_test_student(&pool, "F").await;

    for (date, kind, reason) in [
        ("2025-01-15", "absent", "MENSTRUAL"),
        ("2025-03-10", "late", "MENSTRUAL"),
        ("2025-05-02", "absent", "EXTERNAL_DOMESTIC"),
        ("2025-05-02", "late", "EXTERNAL_DOMESTIC"),
        ("2025-08-20", "absent", "EXTERNAL_OVERSEAS"),
        ("2024-12-30", "absent", "NORMAL"),
    ] {
        let (status, _) = post_attendance(
            &pool,
            json!({ "student_id": student_id, "date": date, "type": kind, "reason": reason }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = get_json(
        &pool,
        &format!("/api/attendance/summary?student_id={}&year=2025", student_id),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["student_id"], student_id);
    assert_eq!(body["year"], 2025);
    assert_eq!(body["counts_by_type"]["absent"], 3);
    assert_eq!(body["counts_by_type"]["late"], 2);
    assert_eq!(body["counts_by_type"]["present"], 0);
    assert_eq!(body["counts_by_type"]["early_leave"], 0);
    assert_eq!(body["counts_by_type"]["period_absence"], 0);
    assert_eq!(body["external_domestic_days"], 1);
    assert_eq!(body["external_overseas_days"], 1);
    assert_eq!(body["menstrual_months_used"], json!(["2025-01", "2025-03"]));
    assert_eq!(body["warnings"], json!([]));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_summary_flags_overshoot_from_outside_ledger(pool: PgPool) {
    let student_id = create_test_student(&pool, "M").await;

    // Rows written directly bypass the write-time quota.
    for day in 1..=8 {
        sqlx::query(
            r#"
            INSERT INTO attendances (student_id, date, type, reason)
            VALUES ($1, make_date(2025, 6, $2), 'absent', 'EXTERNAL_DOMESTIC')
            "#,
        )
        .bind(student_id)
        .bind(day)
        .execute(&pool)
        .await
        .unwrap();
    }

    let (status, body) = get_json(
        &pool,
        &format!("/api/attendance/summary?student_id={}&year=2025", student_id),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["external_domestic_days"], 8);
    let warnings = body["warnings"].as_array().unwrap();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].as_str().unwrap().contains("domestic"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_summary_for_extreme_years_is_empty(pool: PgPool) {
    let student_id = create_test_student(&pool, "M").await;
    post_attendance(
        &pool,
        json!({ "student_id": student_id, "date": "2025-03-10", "type": "absent" }),
    )
    .await;

    for year in [1899, 300_000] {
        let (status, body) = get_json(
            &pool,
            &format!("/api/attendance/summary?student_id={}&year={}", student_id, year),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["year"], year);
        assert!(
            body["counts_by_type"]
                .as_object()
                .unwrap()
                .values()
                .all(|count| *count == 0)
        );
        assert_eq!(body["external_domestic_days"], 0);
        assert_eq!(body["external_overseas_days"], 0);
        assert_eq!(body["menstrual_months_used"], json!([]));
        assert_eq!(body["warnings"], json!([]));
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_store_maps_unique_violation_to_conflict(pool: PgPool) {
    let student_id = create_test_student(&pool, "F").await;
    let store = PgAttendanceStore::new(pool.clone());
    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let record = NewAttendanceRecord {
        student_id,
        date,
        kind: AttendanceType::Late,
        reason: AttendanceReason::Normal,
        periods: 0,
        note: None,
    };

    store.insert(record.clone()).await.unwrap();

    let err = store
        .insert(NewAttendanceRecord {
            reason: AttendanceReason::Official,
            ..record
        })
        .await
        .unwrap_err();
    match err {
        StoreError::Conflict {
            student_id: conflict_student,
            date: conflict_date,
            kind,
        } => {
            assert_eq!(conflict_student, student_id);
            assert_eq!(conflict_date, date);
            assert_eq!(kind, AttendanceType::Late);
        }
        other => panic!("expected a conflict, got {other:?}"),
    }

    let stored = store
        .query_range(student_id, Some(date), Some(date))
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_health(pool: PgPool) {
    let (status, body) = get_json(&pool, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
