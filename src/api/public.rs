use rocket::{serde::json::Json, Route, State};

use crate::{
    election::Election,
    error::{Error, Result},
    model::{
        api::{
            election::ElectionStatus,
            tally::{CandidateTallyDesc, DepartmentVotes},
        },
        common::{department::Department, election::CandidateKey},
        db::candidate::Candidate,
    },
    store::SharedStore,
};

pub fn routes() -> Vec<Route> {
    routes![election_status, candidates, candidate_totals, department_totals]
}

#[get("/election/status")]
async fn election_status(election: &State<Election>) -> Result<Json<ElectionStatus>> {
    Ok(Json(election.status().await?))
}

#[get("/candidates")]
async fn candidates(store: &State<SharedStore>) -> Result<Json<Vec<Candidate>>> {
    let mut candidates = store
        .candidates()
        .await
        .map_err(Error::persistence("load candidates"))?;
    candidates.sort_by(|a, b| a.key().cmp(&b.key()));
    Ok(Json(candidates))
}

#[get("/tally/<position>/<name>")]
async fn candidate_totals(
    position: String,
    name: String,
    election: &State<Election>,
) -> Result<Json<CandidateTallyDesc>> {
    let key = CandidateKey::new(position, name);
    Ok(Json(election.candidate_tally(&key).await?))
}

#[get("/tally/<position>/<name>/<department>")]
async fn department_totals(
    position: String,
    name: String,
    department: Department,
    election: &State<Election>,
) -> Result<Json<DepartmentVotes>> {
    let key = CandidateKey::new(position, name);
    let tally = election.candidate_tally(&key).await?;
    Ok(Json(DepartmentVotes {
        department,
        votes: tally.votes[department.index()],
    }))
}
