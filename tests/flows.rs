//! End-to-end flows against a mocked collaborator: OTP login, class
//! creation with the derived code, enrollment and grade entry.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use deanreg::api::{ApiClient, CredentialStore, MemoryCredentials, OtpChallenge};
use deanreg::auth::{AuthFlow, AuthState, LoginResult};
use deanreg::dean;
use deanreg::form::{ClassForm, ClassFormEvent};
use deanreg::models::{ClassGradeRow, Grade, GradeType};

fn client_for(server: &MockServer) -> (ApiClient, Arc<MemoryCredentials>) {
    let store = Arc::new(MemoryCredentials::new());
    let api = ApiClient::new(&server.uri(), store.clone() as Arc<dyn CredentialStore>).unwrap();
    (api, store)
}

#[tokio::test]
async fn login_with_otp_round_trip_stores_the_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_string_contains("username=dean"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "requires_otp": true,
            "message": "OTP đã được gửi đến email của bạn. Mã có hiệu lực trong 5 phút.",
            "email_hint": "dea***@hust.edu.vn"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/verify-otp"))
        .and(body_partial_json(json!({"username": "dean", "otp": "123456"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "token_type": "bearer",
            "role": "dean"
        })))
        .mount(&server)
        .await;

    let (api, store) = client_for(&server);
    let flow = AuthFlow::new(&api);

    match flow.login("dean", "secret").await.unwrap() {
        LoginResult::OtpRequired { email_hint, .. } => {
            assert_eq!(email_hint.as_deref(), Some("dea***@hust.edu.vn"));
        }
        LoginResult::Authenticated { .. } => panic!("expected an OTP challenge"),
    }
    assert_eq!(
        flow.state(),
        AuthState::Challenged {
            username: "dean".into()
        }
    );

    let role = flow.verify_otp("123456").await.unwrap();
    assert_eq!(role, "dean");
    assert_eq!(store.token().as_deref(), Some("fresh-token"));
    assert!(store.challenge().is_none(), "challenge cleared on success");
    assert_eq!(flow.state(), AuthState::Authenticated);
}

#[tokio::test]
async fn login_without_second_factor_authenticates_directly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "plain-token",
            "token_type": "bearer",
            "role": "lecturer"
        })))
        .mount(&server)
        .await;

    let (api, store) = client_for(&server);
    let flow = AuthFlow::new(&api);
    match flow.login("lect", "secret").await.unwrap() {
        LoginResult::Authenticated { role } => assert_eq!(role, "lecturer"),
        LoginResult::OtpRequired { .. } => panic!("expected direct authentication"),
    }
    assert_eq!(store.token().as_deref(), Some("plain-token"));
}

#[tokio::test]
async fn resend_after_cooldown_resets_the_challenge() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/resend-otp"))
        .and(body_string_contains("username=dean"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "OTP mới đã được gửi. Mã có hiệu lực trong 5 phút."
        })))
        .mount(&server)
        .await;

    let (api, store) = client_for(&server);
    // A challenge whose cooldown has already elapsed.
    let issued = Utc::now() - Duration::seconds(120);
    store.set_challenge(OtpChallenge {
        username: "dean".into(),
        email_hint: None,
        issued_at: issued,
        cooldown_until: issued + Duration::seconds(60),
    });

    let flow = AuthFlow::new(&api);
    let message = flow.resend_otp().await.unwrap();
    assert!(message.starts_with("OTP mới đã được gửi"));

    let challenge = store.challenge().unwrap();
    assert!(
        challenge.cooldown_remaining(Utc::now()).is_some(),
        "cooldown restarts after a resend"
    );
}

#[tokio::test]
async fn class_creation_submits_the_derived_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/deans/classes"))
        .and(body_partial_json(json!({
            "code": "IT304020242",
            "course_id": 5,
            "semester": "2024.2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 31,
            "code": "IT304020242",
            "course_id": 5,
            "lecturer_id": 2,
            "semester": "2024.2",
            "max_students": 50,
            "enrolled_count": 0
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (api, store) = client_for(&server);
    store.set_token("tok");

    let form = ClassForm::create()
        .apply(ClassFormEvent::SetCourse {
            id: 5,
            code: "IT3040".into(),
        })
        .apply(ClassFormEvent::SetLecturer(2))
        .apply(ClassFormEvent::SetSemester("2024.2".into()));
    let payload = form.payload().unwrap();
    assert_eq!(payload.code, "IT304020242");

    let created = dean::catalog::create_class(&api, &payload).await.unwrap();
    assert_eq!(created.id, 31);
    assert_eq!(created.code, "IT304020242");
}

#[tokio::test]
async fn bulk_enrollment_posts_the_id_set_and_reports_the_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/deans/classes/12/enrollments/bulk"))
        .and(body_partial_json(json!({"student_ids": [4, 9]})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "2 sinh viên đã được thêm"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (api, store) = client_for(&server);
    store.set_token("tok");

    let added = dean::catalog::enroll_students(&api, 12, &[4, 9]).await.unwrap();
    assert_eq!(added, 2);
}

#[tokio::test]
async fn grade_entry_updates_existing_components_and_creates_missing_ones() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/deans/grades/71"))
        .and(body_partial_json(json!({
            "enrollment_id": 9,
            "grade_type": "midterm",
            "score": 8.5,
            "weight": 0.3
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 71,
            "grade_type": "midterm",
            "score": 8.5,
            "weight": 0.3
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/deans/grades"))
        .and(body_partial_json(json!({
            "enrollment_id": 9,
            "grade_type": "final",
            "score": 7.0,
            "weight": 0.7
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 72,
            "grade_type": "final",
            "score": 7.0,
            "weight": 0.7
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (api, store) = client_for(&server);
    store.set_token("tok");

    let row = ClassGradeRow {
        enrollment_id: 9,
        student_id: 4,
        student_code: "20210001".into(),
        full_name: "Nguyễn Văn Đức".into(),
        grades: vec![Grade {
            id: 71,
            grade_type: GradeType::Midterm,
            score: 8.0,
            weight: 0.3,
        }],
    };

    // Midterm already exists -> PUT.
    let updated = dean::grades::save_grade(&api, &row, GradeType::Midterm, 8.5)
        .await
        .unwrap();
    assert_eq!(updated.id, 71);

    // Final is missing -> POST.
    let created = dean::grades::save_grade(&api, &row, GradeType::Final, 7.0)
        .await
        .unwrap();
    assert_eq!(created.id, 72);
}

#[tokio::test]
async fn semester_activation_posts_to_the_activate_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/deans/semesters/7/activate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let (api, store) = client_for(&server);
    store.set_token("tok");
    dean::calendar::activate_semester(&api, 7).await.unwrap();
}
