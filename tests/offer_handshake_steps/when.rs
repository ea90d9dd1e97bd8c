//! When steps for offer handshake BDD scenarios.

use super::world::{OfferWorld, run_async};
use rstest_bdd_macros::when;

#[when("the introducee accepts the offer")]
fn introducee_accepts(world: &mut OfferWorld) -> Result<(), eyre::Report> {
    let offer = world
        .offer
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing offer in scenario world"))?;
    let updated = run_async(world.service.introducee_accept(offer.id()))?;
    world.offer = Some(updated);
    Ok(())
}

#[when("the introducee declines the offer")]
fn introducee_declines(world: &mut OfferWorld) -> Result<(), eyre::Report> {
    let offer = world
        .offer
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing offer in scenario world"))?;
    let updated = run_async(world.service.introducee_decline(offer.id()))?;
    world.offer = Some(updated);
    Ok(())
}

#[when("the connector confirms the introduction")]
fn connector_confirms(world: &mut OfferWorld) -> Result<(), eyre::Report> {
    let offer = world
        .offer
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing offer in scenario world"))?;
    let updated = run_async(world.service.connector_confirm(offer.id()))?;
    world.offer = Some(updated);
    Ok(())
}
