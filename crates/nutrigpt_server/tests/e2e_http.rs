use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nutrigpt_client::config::GeminiConfig;
use nutrigpt_client::http_client::ReqwestGeminiClient;
use nutrigpt_client::{
    DailyPlan, GenerationError, Meal, Meals, NutritionChat, PlanGenerator, UserProfile,
};
use nutrigpt_server::http::api_router;
use nutrigpt_server::{AppState, FixedClock, MemoryStore};

struct LocalMockGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl PlanGenerator for LocalMockGenerator {
    async fn generate(
        &self,
        _profile: &UserProfile,
        _previous_plan: Option<&DailyPlan>,
        _today: NaiveDate,
    ) -> Result<DailyPlan, GenerationError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let meal = Meal {
            time: "07:30".into(),
            name: format!("Plano {n}"),
            calories: 400.0,
            ..Meal::default()
        };
        Ok(DailyPlan {
            total_calories: 1700.0,
            meals: Meals {
                breakfast: meal.clone(),
                lunch: meal.clone(),
                snack: meal.clone(),
                dinner: meal,
            },
            ..DailyPlan::default()
        })
    }
}

#[async_trait]
impl NutritionChat for LocalMockGenerator {
    async fn ask(
        &self,
        _profile: &UserProfile,
        plan: Option<&DailyPlan>,
        _question: &str,
    ) -> Result<String, GenerationError> {
        match plan {
            Some(p) => Ok(format!("Hoje são {} kcal.", p.total_calories)),
            None => Err(GenerationError::EmptyResponse),
        }
    }
}

fn profile_json() -> Value {
    json!({
        "age": 34,
        "height": 175,
        "currentWeight": 80,
        "targetWeight": 74,
        "gender": "female",
        "region": "Curitiba, Brazil",
        "restrictions": null,
        "preferences": "",
        "activityLevel": "MODERATELY_ACTIVE",
        "goal": "LOSE_WEIGHT"
    })
}

async fn spawn(state: AppState) -> SocketAddr {
    let app = api_router().with_state(Arc::new(state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = axum::serve(listener, app.into_make_service());
    tokio::spawn(async move {
        server.await.ok();
    });
    addr
}

fn mock_state() -> AppState {
    let generator = Arc::new(LocalMockGenerator {
        calls: AtomicUsize::new(0),
    });
    AppState::new(
        Arc::new(MemoryStore::new()),
        generator.clone(),
        generator,
        Arc::new(FixedClock::new(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())),
    )
}

#[tokio::test]
async fn e2e_onboarding_plan_chat_and_progress() {
    let addr = spawn(mock_state()).await;
    let http = Client::new();
    let url = |p: &str| format!("http://{addr}{p}");

    let res = http.get(url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // nothing works before onboarding
    let res = http.get(url("/plan")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let mut bad = profile_json();
    bad["height"] = json!(0);
    let res = http.put(url("/profile")).json(&bad).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = http.put(url("/profile")).json(&profile_json()).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let stored: Value = http.get(url("/profile")).send().await.unwrap().json().await.unwrap();
    assert_eq!(stored["restrictions"], "");

    // chat before any plan exists falls back to an apology
    let welcome: Value = http.get(url("/chat/welcome")).send().await.unwrap().json().await.unwrap();
    assert!(welcome["content"].as_str().unwrap().contains("perder peso"));
    let answer: Value = http
        .post(url("/chat"))
        .json(&json!({"question": "Quantas calorias?"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(answer["content"].as_str().unwrap().starts_with("Tive um problema"));

    let first: Value = http.get(url("/plan")).send().await.unwrap().json().await.unwrap();
    assert_eq!(first["origin"], "generated");
    assert_eq!(first["dateKey"], "19/10/2026");
    assert_eq!(first["persisted"], true);
    assert_eq!(first["plan"]["meals"]["breakfast"]["name"], "Plano 1");

    let second: Value = http.get(url("/plan")).send().await.unwrap().json().await.unwrap();
    assert_eq!(second["origin"], "cached");
    assert_eq!(second["plan"], first["plan"]);

    let forced: Value = http
        .get(url("/plan?force=true"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(forced["origin"], "generated");
    assert_eq!(forced["plan"]["meals"]["breakfast"]["name"], "Plano 2");

    let answer: Value = http
        .post(url("/chat"))
        .json(&json!({"question": "Quantas calorias?"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(answer["content"], "Hoje são 1700 kcal.");
    assert_eq!(answer["role"], "assistant");

    let progress: Value = http.get(url("/progress")).send().await.unwrap().json().await.unwrap();
    assert_eq!(progress["entries"].as_array().unwrap().len(), 1);
    assert_eq!(progress["entries"][0]["id"], "initial");
    assert_eq!(progress["summary"]["latestBmi"], 26.1);

    let res = http
        .post(url("/progress"))
        .json(&json!({"weight": 78.5, "waist": 90}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let progress: Value = http.get(url("/progress")).send().await.unwrap().json().await.unwrap();
    assert_eq!(progress["entries"].as_array().unwrap().len(), 2);
    assert_eq!(progress["summary"]["totalChange"], -1.5);
    assert_eq!(progress["summary"]["category"], "overweight");
    assert_eq!(progress["summary"]["categoryLabel"], "Sobrepeso");

    // logout drops profile and plan, keeps progress
    let res = http.delete(url("/profile")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = http.get(url("/profile")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    http.put(url("/profile")).json(&profile_json()).send().await.unwrap();
    let progress: Value = http.get(url("/progress")).send().await.unwrap().json().await.unwrap();
    assert_eq!(progress["entries"].as_array().unwrap().len(), 2);
}

fn gemini_plan_body(breakfast_time: &str) -> Value {
    let meal = json!({"time": breakfast_time, "name": "Cuscuz", "calories": 380, "ingredients": []});
    let plan = json!({
        "motivationalQuote": "Vamos!",
        "totalCalories": 1750,
        "macroTargets": {"protein": 120, "carbs": 190, "fats": 55},
        "meals": {"breakfast": meal, "lunch": meal, "snack": meal, "dinner": meal}
    });
    json!({"candidates": [{"content": {"parts": [{"text": plan.to_string()}]}}]})
}

#[tokio::test]
async fn e2e_plan_through_gemini_client_keeps_cache_on_failure() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_plan_body("06:45")))
        .up_to_n_times(1)
        .mount(&gemini)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&gemini)
        .await;

    let mut cfg = GeminiConfig::new(SecretString::new("k".into()));
    cfg.base_url = gemini.uri();
    cfg.max_retries = 0;
    cfg.timeout = Duration::from_secs(5);
    let client = ReqwestGeminiClient::new(&cfg).unwrap();
    let state = AppState::with_client(
        Arc::new(MemoryStore::new()),
        client,
        Arc::new(FixedClock::new(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())),
    );
    let addr = spawn(state).await;
    let http = Client::new();
    let url = |p: &str| format!("http://{addr}{p}");

    http.put(url("/profile")).json(&profile_json()).send().await.unwrap();
    let first: Value = http.get(url("/plan")).send().await.unwrap().json().await.unwrap();
    assert_eq!(first["plan"]["meals"]["breakfast"]["time"], "06:45");

    let res = http.get(url("/plan?force=true")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(res.text().await.unwrap().contains("try again"));

    let again: Value = http.get(url("/plan")).send().await.unwrap().json().await.unwrap();
    assert_eq!(again["origin"], "cached");
    assert_eq!(again["plan"], first["plan"]);
}
