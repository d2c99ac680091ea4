use rocket::{serde::json::Json, Route, State};

use crate::{
    election::Election,
    error::{Error, Result},
    logging::RequestId,
    model::{
        api::{
            ballot::{BallotSpec, VoteReceipt},
            voter::{VoterDesc, VoterRegistration},
        },
        db::voter::Voter,
    },
    store::SharedStore,
};

pub fn routes() -> Vec<Route> {
    routes![register_voter, get_voter, cast_vote]
}

#[post("/voters", data = "<registration>", format = "json")]
async fn register_voter(
    registration: Json<VoterRegistration>,
    store: &State<SharedStore>,
) -> Result<Json<VoterDesc>> {
    let voter = Voter::try_from(registration.into_inner())?;
    let inserted = store
        .insert_voter(&voter)
        .await
        .map_err(Error::persistence("register voter"))?;
    if !inserted {
        return Err(Error::Conflict(format!(
            "voter {} is already registered",
            voter.id
        )));
    }
    info!("Registered voter {}", voter.id);
    Ok(Json(voter.into()))
}

#[get("/voters/<id>")]
async fn get_voter(id: String, store: &State<SharedStore>) -> Result<Json<VoterDesc>> {
    let voter = store
        .voter(&id)
        .await
        .map_err(Error::persistence("load voter"))?
        .ok_or(Error::VoterNotFound(id))?;
    Ok(Json(voter.into()))
}

#[post("/votes", data = "<ballot>", format = "json")]
async fn cast_vote(
    request_id: &RequestId,
    ballot: Json<BallotSpec>,
    election: &State<Election>,
) -> Result<Json<VoteReceipt>> {
    debug!("req{request_id}: ballot from voter {}", ballot.voter_id);
    let receipt = election
        .cast_vote(&ballot.voter_id, &ballot.selections, &ballot.affiliation)
        .await?;
    Ok(Json(receipt))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json::json,
    };

    use super::*;
    use crate::model::{
        api::election::WindowSpec,
        common::{department::Department, election::CandidateKey},
        db::{candidate::Candidate, window::ElectionWindow},
    };
    use crate::store::{ElectionStore, MemoryStore};

    async fn register(client: &Client, registration: &VoterRegistration) -> Status {
        client
            .post(uri!(register_voter))
            .header(ContentType::JSON)
            .body(json!(registration).to_string())
            .dispatch()
            .await
            .status()
    }

    async fn vote(client: &Client, ballot: &BallotSpec) -> Status {
        client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .body(json!(ballot).to_string())
            .dispatch()
            .await
            .status()
    }

    /// Candidates registered and voting open.
    async fn open_election(store: &MemoryStore) {
        for candidate in Candidate::slate() {
            store.insert_candidate(&candidate).await.unwrap();
        }
        let spec = WindowSpec::example_open();
        let window = ElectionWindow::new(spec.start, spec.end, chrono::Utc::now());
        store.put_window(&window).await.unwrap();
    }

    #[backend_test]
    async fn register_and_look_up(client: Client) {
        let registration = VoterRegistration::example();
        assert_eq!(Status::Ok, register(&client, &registration).await);
        assert_eq!(Status::Conflict, register(&client, &registration).await);

        let response = client
            .get(uri!(get_voter(registration.student_id.as_str())))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let voter: VoterDesc = response.into_json().await.unwrap();
        assert_eq!(voter.student_name, registration.student_name);
        assert!(!voter.has_voted);

        let response = client.get(uri!(get_voter("1999-99999"))).dispatch().await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn blank_registration_rejected(client: Client, store: MemoryStore) {
        let mut registration = VoterRegistration::example();
        registration.program = "".to_string();
        assert_eq!(Status::BadRequest, register(&client, &registration).await);
        assert!(store.voter(&registration.student_id).await.unwrap().is_none());
    }

    #[backend_test]
    async fn vote_once(client: Client, store: MemoryStore) {
        open_election(&store).await;
        register(&client, &VoterRegistration::example()).await;
        let ballot = BallotSpec::example();

        let response = client
            .post(uri!(cast_vote))
            .header(ContentType::JSON)
            .body(json!(ballot).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let receipt: VoteReceipt = response.into_json().await.unwrap();
        assert_eq!(receipt.department, Department::Cics);

        assert_eq!(Status::Conflict, vote(&client, &ballot).await);
        let tally = store
            .tally(&CandidateKey::new("Governor", "Alice"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(tally.total(), 1);

        let voter: VoterDesc = client
            .get(uri!(get_voter(ballot.voter_id.as_str())))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert!(voter.has_voted);
    }

    #[backend_test]
    async fn vote_rejections(client: Client, store: MemoryStore) {
        // Closed: no window yet.
        register(&client, &VoterRegistration::example()).await;
        assert_eq!(Status::Forbidden, vote(&client, &BallotSpec::example()).await);

        open_election(&store).await;

        let mut unregistered = BallotSpec::example2();
        unregistered.voter_id = "1999-99999".to_string();
        assert_eq!(Status::NotFound, vote(&client, &unregistered).await);

        let mut bad_affiliation = BallotSpec::example();
        bad_affiliation.affiliation = "Bachelor of Laws".to_string();
        assert_eq!(
            Status::UnprocessableEntity,
            vote(&client, &bad_affiliation).await
        );

        let mut unknown_candidate = BallotSpec::example();
        unknown_candidate
            .selections
            .insert("Governor".to_string(), "Mallory".to_string());
        assert_eq!(Status::BadRequest, vote(&client, &unknown_candidate).await);

        assert!(store.tallies().await.unwrap().is_empty());
        assert_eq!(Status::Ok, vote(&client, &BallotSpec::example()).await);
    }

    #[backend_test]
    async fn store_outage_is_transient(client: Client, store: MemoryStore) {
        open_election(&store).await;
        register(&client, &VoterRegistration::example()).await;

        store.set_fail_writes(true);
        assert_eq!(
            Status::ServiceUnavailable,
            vote(&client, &BallotSpec::example()).await
        );
        store.set_fail_writes(false);
        assert_eq!(Status::Ok, vote(&client, &BallotSpec::example()).await);
    }
}
