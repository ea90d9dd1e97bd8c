//! Behaviour tests for the offer two-step handshake.

#[path = "offer_handshake_steps/mod.rs"]
mod offer_handshake_steps_defs;

use offer_handshake_steps_defs::world::{OfferWorld, world};
use rstest_bdd_macros::scenario;

#[scenario(
    path = "tests/features/offer_handshake.feature",
    name = "Introducee accepts and connector confirms"
)]
#[tokio::test(flavor = "multi_thread")]
async fn accept_then_confirm_completes(world: OfferWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/offer_handshake.feature",
    name = "Introducee declines before confirmation"
)]
#[tokio::test(flavor = "multi_thread")]
async fn decline_never_reaches_confirmation(world: OfferWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/offer_handshake.feature",
    name = "Late confirmation after a decline is ignored"
)]
#[tokio::test(flavor = "multi_thread")]
async fn late_confirmation_is_ignored(world: OfferWorld) {
    let _ = world;
}
