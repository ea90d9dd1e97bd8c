//! Then steps for offer handshake BDD scenarios.

use super::world::OfferWorld;
use liaison::saga::adapters::memory::RecordedEffect;
use liaison::saga::domain::OfferStatus;
use rstest_bdd_macros::then;

fn awarded_bounties(world: &OfferWorld) -> usize {
    world
        .effects
        .recorded()
        .into_iter()
        .filter(|effect| matches!(effect, RecordedEffect::BountyAwarded { .. }))
        .count()
}

#[then(r#"the offer status is "{status}""#)]
fn offer_status_is(world: &OfferWorld, status: String) -> Result<(), eyre::Report> {
    let expected = OfferStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;

    let offer = world
        .offer
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing offer"))?;

    if offer.status() != expected {
        return Err(eyre::eyre!(
            "expected status {}, found {}",
            expected.as_str(),
            offer.status().as_str()
        ));
    }

    Ok(())
}

#[then("exactly one bounty is awarded")]
fn one_bounty_awarded(world: &OfferWorld) -> Result<(), eyre::Report> {
    let awards = awarded_bounties(world);
    if awards != 1 {
        return Err(eyre::eyre!("expected one bounty award, found {awards}"));
    }
    Ok(())
}

#[then("no bounty is awarded")]
fn no_bounty_awarded(world: &OfferWorld) -> Result<(), eyre::Report> {
    let awards = awarded_bounties(world);
    if awards != 0 {
        return Err(eyre::eyre!("expected no bounty awards, found {awards}"));
    }
    Ok(())
}
