//! Given steps for offer handshake BDD scenarios.

use super::world::{OfferWorld, run_async};
use eyre::WrapErr;
use liaison::identity::UserId;
use liaison::saga::services::CreateOfferRequest;
use rstest_bdd_macros::given;

#[given("an offer awaiting the introducee's response")]
fn offer_awaiting_response(world: &mut OfferWorld) -> Result<(), eyre::Report> {
    let created = run_async(world.service.create(CreateOfferRequest {
        introducee_id: UserId::new(),
        connector_id: UserId::new(),
        subject: "Priya Raman".to_owned(),
        bounty: None,
    }))
    .wrap_err("create offer for handshake scenario")?;
    world.offer = Some(created);
    Ok(())
}
