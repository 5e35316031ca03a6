//! Translation between wire messages and world commands.

use rat_defence_core::{Command, GridPos, PlayerSide, TowerId, TowerKind};
use rat_defence_network::{Message, MessageKind};
use serde_json::{json, Value};

fn side_name(side: PlayerSide) -> &'static str {
    match side {
        PlayerSide::Solo => "solo",
        PlayerSide::Left => "left",
        PlayerSide::Right => "right",
    }
}

fn side_from_name(name: &str) -> Option<PlayerSide> {
    match name {
        "solo" => Some(PlayerSide::Solo),
        "left" => Some(PlayerSide::Left),
        "right" => Some(PlayerSide::Right),
        _ => None,
    }
}

fn field_u32(data: &Value, key: &str) -> Option<u32> {
    data.get(key)?.as_u64()?.try_into().ok()
}

/// Decodes a tower-related message payload into a world command.
///
/// Returns `None` for message kinds without a direct command mapping or for
/// payloads with missing or invalid fields.
#[must_use]
pub fn command_from_message(message: &Message) -> Option<Command> {
    match message.kind {
        MessageKind::PlaceTower => {
            let kind = TowerKind::from_name(message.data.get("kind")?.as_str()?)?;
            let x = field_u32(&message.data, "x")?;
            let y = field_u32(&message.data, "y")?;
            let side = side_from_name(message.data.get("side")?.as_str()?)?;
            Some(Command::PlaceTower {
                kind,
                at: GridPos::new(x, y),
                side,
            })
        }
        MessageKind::TowerUpgrade => {
            let tower = TowerId::new(field_u32(&message.data, "tower")?);
            Some(Command::UpgradeTower { tower })
        }
        MessageKind::TowerSell => {
            let tower = TowerId::new(field_u32(&message.data, "tower")?);
            Some(Command::SellTower { tower })
        }
        _ => None,
    }
}

/// Builds the wire message announcing a local tower placement.
#[must_use]
pub fn place_tower_message(
    kind: TowerKind,
    at: GridPos,
    side: PlayerSide,
    player_id: &str,
) -> Message {
    Message::new(
        MessageKind::PlaceTower,
        json!({
            "kind": kind.name(),
            "x": at.x(),
            "y": at.y(),
            "side": side_name(side),
        }),
        player_id,
    )
}

/// Builds the wire message announcing a local tower upgrade.
#[must_use]
pub fn upgrade_tower_message(tower: TowerId, player_id: &str) -> Message {
    Message::new(
        MessageKind::TowerUpgrade,
        json!({ "tower": tower.get() }),
        player_id,
    )
}

/// Builds the wire message announcing a local tower sale.
#[must_use]
pub fn sell_tower_message(tower: TowerId, player_id: &str) -> Message {
    Message::new(
        MessageKind::TowerSell,
        json!({ "tower": tower.get() }),
        player_id,
    )
}

/// Builds the wire message requesting the next wave.
#[must_use]
pub fn start_wave_message(player_id: &str) -> Message {
    Message::new(MessageKind::StartWave, Value::Null, player_id)
}

/// Builds the keepalive message peers exchange between commands.
#[must_use]
pub fn heartbeat_message(player_id: &str) -> Message {
    Message::new(MessageKind::Heartbeat, Value::Null, player_id)
}

/// Builds the wire message carrying a chat line.
#[must_use]
pub fn chat_message(text: &str, player_id: &str) -> Message {
    Message::new(MessageKind::ChatMessage, json!({ "text": text }), player_id)
}

/// Builds the authoritative state snapshot for a late joiner.
#[must_use]
pub fn sync_state_message(gold: u32, lives: u32, wave: u32, player_id: &str) -> Message {
    Message::new(
        MessageKind::SyncState,
        json!({ "gold": gold, "lives": lives, "wave": wave }),
        player_id,
    )
}

#[cfg(test)]
mod tests {
    use super::{command_from_message, heartbeat_message, place_tower_message, start_wave_message};
    use rat_defence_core::{Command, GridPos, PlayerSide, TowerKind};
    use rat_defence_network::MessageKind;

    #[test]
    fn placement_messages_round_trip_into_commands() {
        let message = place_tower_message(
            TowerKind::Bomb,
            GridPos::new(4, 7),
            PlayerSide::Left,
            "player2",
        );
        let command = command_from_message(&message).expect("valid payload");
        assert_eq!(
            command,
            Command::PlaceTower {
                kind: TowerKind::Bomb,
                at: GridPos::new(4, 7),
                side: PlayerSide::Left,
            }
        );
    }

    #[test]
    fn intent_only_messages_have_no_command_mapping() {
        let message = start_wave_message("player1");
        assert!(command_from_message(&message).is_none());
    }

    #[test]
    fn heartbeats_carry_no_payload_and_map_to_no_command() {
        let message = heartbeat_message("player1");
        assert_eq!(message.kind, MessageKind::Heartbeat);
        assert!(message.data.is_null());
        assert!(command_from_message(&message).is_none());
    }
}
