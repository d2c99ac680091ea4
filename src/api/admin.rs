use std::collections::BTreeSet;

use chrono::Utc;
use rocket::{serde::json::Json, Route, State};

use crate::{
    election::Election,
    error::{Error, Result},
    model::{
        api::{
            auth::AuthToken,
            election::{ElectionStatus, WindowSpec},
            tally::PositionTally,
        },
        db::candidate::Candidate,
    },
    store::SharedStore,
};

pub fn routes() -> Vec<Route> {
    routes![set_window, add_candidates, full_tally]
}

#[put("/election/window", data = "<spec>", format = "json")]
async fn set_window(
    token: AuthToken,
    spec: Json<WindowSpec>,
    election: &State<Election>,
) -> Result<Json<ElectionStatus>> {
    let window = election.set_window(spec.start, spec.end).await?;
    info!("Admin {} set the election window", token.username);
    Ok(Json(ElectionStatus::of(&window, Utc::now())))
}

/// Register a batch of candidates. The whole batch is checked before any is inserted.
#[post("/candidates", data = "<candidates>", format = "json")]
async fn add_candidates(
    _token: AuthToken,
    candidates: Json<Vec<Candidate>>,
    store: &State<SharedStore>,
) -> Result<Json<Vec<Candidate>>> {
    let candidates = candidates.into_inner();
    if candidates.is_empty() {
        return Err(Error::BadRequest("no candidates given".to_string()));
    }

    let mut seen = BTreeSet::new();
    for candidate in &candidates {
        if candidate.position.trim().is_empty() || candidate.name.trim().is_empty() {
            return Err(Error::BadRequest(
                "candidate position and name must not be blank".to_string(),
            ));
        }
        let key = candidate.key();
        let existing = store
            .candidate(&key)
            .await
            .map_err(Error::persistence("look up candidate"))?;
        if existing.is_some() || !seen.insert(key.clone()) {
            return Err(Error::Conflict(format!("candidate {key} already exists")));
        }
    }

    for candidate in &candidates {
        let inserted = store
            .insert_candidate(candidate)
            .await
            .map_err(Error::persistence("register candidate"))?;
        if !inserted {
            return Err(Error::Conflict(format!(
                "candidate {} already exists",
                candidate.key()
            )));
        }
    }
    info!("Registered {} candidates", candidates.len());

    Ok(Json(candidates))
}

#[get("/tally")]
async fn full_tally(
    _token: AuthToken,
    election: &State<Election>,
) -> Result<Json<Vec<PositionTally>>> {
    let tally = election.tally().await?;
    Ok(Json(tally))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json::json,
    };

    use super::*;
    use crate::model::{
        api::ballot::BallotSpec, common::election::CandidateKey, db::voter::Voter,
    };
    use crate::store::{ElectionStore, MemoryStore};

    async fn put_window(client: &Client, spec: &WindowSpec) -> (Status, Option<ElectionStatus>) {
        let response = client
            .put(uri!(set_window))
            .header(ContentType::JSON)
            .body(json!(spec).to_string())
            .dispatch()
            .await;
        let status = response.status();
        (status, response.into_json().await)
    }

    #[backend_test(admin)]
    async fn set_window_open_and_closed(client: Client, store: MemoryStore) {
        let (status, body) = put_window(&client, &WindowSpec::example_open()).await;
        assert_eq!(Status::Ok, status);
        assert!(body.unwrap().active);
        assert!(store.window().await.unwrap().unwrap().active);

        let (status, body) = put_window(&client, &WindowSpec::example_closed()).await;
        assert_eq!(Status::Ok, status);
        assert!(!body.unwrap().active);
        assert!(!store.window().await.unwrap().unwrap().active);
    }

    #[backend_test(admin)]
    async fn set_window_rejects_inverted_range(client: Client, store: MemoryStore) {
        let now = Utc::now();
        let spec = WindowSpec {
            start: now + Duration::hours(1),
            end: now,
        };
        let (status, _) = put_window(&client, &spec).await;
        assert_eq!(Status::BadRequest, status);
        assert!(store.window().await.unwrap().is_none());
    }

    #[backend_test]
    async fn set_window_requires_admin(client: Client, store: MemoryStore) {
        let (status, _) = put_window(&client, &WindowSpec::example_open()).await;
        assert_eq!(Status::Unauthorized, status);
        assert!(store.window().await.unwrap().is_none());
    }

    #[backend_test(admin)]
    async fn add_candidates_then_conflict(client: Client, store: MemoryStore) {
        let response = client
            .post(uri!(add_candidates))
            .header(ContentType::JSON)
            .body(json!(Candidate::slate()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(store.candidates().await.unwrap().len(), 5);

        // Re-registering one existing candidate rejects the whole batch.
        let batch = vec![
            Candidate::example("Treasurer", "Frank"),
            Candidate::example("Governor", "Alice"),
        ];
        let response = client
            .post(uri!(add_candidates))
            .header(ContentType::JSON)
            .body(json!(batch).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Conflict, response.status());
        assert!(store
            .candidate(&CandidateKey::new("Treasurer", "Frank"))
            .await
            .unwrap()
            .is_none());
    }

    #[backend_test(admin)]
    async fn add_candidates_rejects_blank_names(client: Client, store: MemoryStore) {
        let response = client
            .post(uri!(add_candidates))
            .header(ContentType::JSON)
            .body(json!([Candidate::example("Governor", "  ")]).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
        assert!(store.candidates().await.unwrap().is_empty());
    }

    #[backend_test(admin)]
    async fn full_tally_after_votes(client: Client, store: MemoryStore) {
        for candidate in Candidate::slate() {
            store.insert_candidate(&candidate).await.unwrap();
        }
        put_window(&client, &WindowSpec::example_open()).await;

        for ballot in [BallotSpec::example(), BallotSpec::example2()] {
            let voter = Voter::new(
                ballot.voter_id.clone(),
                "Test Voter".to_string(),
                ballot.affiliation.clone(),
            );
            store.insert_voter(&voter).await.unwrap();
            let response = client
                .post("/votes")
                .header(ContentType::JSON)
                .body(json!(ballot).to_string())
                .dispatch()
                .await;
            assert_eq!(Status::Ok, response.status());
        }

        let response = client.get(uri!(full_tally)).dispatch().await;
        assert_eq!(Status::Ok, response.status());
        let tally: Vec<PositionTally> = response.into_json().await.unwrap();
        let titles: Vec<_> = tally.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Board Member", "Governor", "Vice Governor"]);
        assert_eq!(tally[1].candidates[0].votes, [0, 0, 1, 0, 0]);
        assert_eq!(tally[1].candidates[1].votes, [0, 0, 0, 0, 1]);
        assert_eq!(tally[2].candidates[1].total, 0);
    }

    #[backend_test]
    async fn full_tally_requires_admin(client: Client) {
        let response = client.get(uri!(full_tally)).dispatch().await;
        assert_eq!(Status::Unauthorized, response.status());
    }
}
