// Headless demo: a local player and an NPC in one world, mirrored into a
// second world over the loopback transport. The mirror never sees input,
// only flushed action buffers, yet its replayed actor converges on the
// same position.

use std::time::{Duration, Instant};

use anyhow::Result;
use glam::Vec3;
use tracing::info;

use parlor::config::load_settings;
use parlor::network::ChannelTransport;
use parlor::protocol::InputState;
use parlor::utils::logging::{init_logging, log_system_info};
use parlor::world::{Action, AvatarMetadata, CollisionMap, Direction, Speed, World};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    log_system_info();

    let mut settings = load_settings().unwrap_or_default();
    // short flush window so the mirror updates a few times during the demo
    settings.network.flush_interval_ms = settings.network.flush_interval_ms.min(500);

    let (mut uplink, mut downlink) = ChannelTransport::pair();
    let mut home = World::new(settings.clone(), CollisionMap::new(512.0, 512.0, 16.0));
    let mut mirror = World::new(settings, CollisionMap::new(512.0, 512.0, 16.0));

    let start = Instant::now();
    let player = home.add_player(
        "ada",
        Vec3::new(64.0, 64.0, 0.0),
        AvatarMetadata::default_look(),
        start,
    );
    home.add_npc(
        "bellhop",
        Vec3::new(256.0, 256.0, 0.0),
        AvatarMetadata::default_look(),
        start,
    );

    info!("demo running: walk east, run north, sit");
    let mut ticker = tokio::time::interval(Duration::from_millis(25));
    loop {
        ticker.tick().await;
        let now = Instant::now();
        let elapsed = now - start;
        if elapsed > Duration::from_secs(5) {
            break;
        }

        let input = if elapsed < Duration::from_secs(2) {
            InputState {
                direction: Direction::East,
                speed: Speed::Walk,
                action: Action::Move,
            }
        } else if elapsed < Duration::from_millis(3500) {
            InputState {
                direction: Direction::North,
                speed: Speed::Run,
                action: Action::Move,
            }
        } else {
            InputState {
                direction: Direction::None,
                speed: Speed::Run,
                action: Action::Sit,
            }
        };
        home.set_player_input(player, input);

        home.tick(now, &mut uplink)?;
        mirror.tick(now, &mut downlink)?;
    }

    let local = home
        .entity(player)
        .expect("player still in world")
        .actor();
    info!(
        "local player at {:?}, action {}",
        local.position().truncate(),
        local.action()
    );
    if let Some(remote) = mirror.entity(player) {
        info!(
            "mirrored actor at {:?}, action {}",
            remote.actor().position().truncate(),
            remote.actor().action()
        );
    } else {
        info!("mirror never saw a flush (demo too short)");
    }
    Ok(())
}
