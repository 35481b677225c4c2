#[cfg(test)]
mod tests {
    use crate::{
        GameType, Player, RoomType, ServerMessage, Stat, parse_server_message,
    };

    #[test]
    fn test_parse_challstr() {
        let message = parse_server_message("|challstr|4|1234abc").unwrap();
        assert_eq!(message, ServerMessage::Challstr("4|1234abc".into()))
    }

    #[test]
    fn test_parse_challstr_invalid() {
        assert!(parse_server_message("|challstr|").is_err());
    }

    #[test]
    fn test_parse_unknown() {
        let message = parse_server_message("|someunknown|data").unwrap();
        assert_eq!(message, ServerMessage::Raw("|someunknown|data".to_string()));
    }

    #[test]
    fn test_parse_empty() {
        let message = parse_server_message("").unwrap();
        assert_eq!(message, ServerMessage::Raw("".to_string()));
    }

    #[test]
    fn test_parse_updateuser_strips_rank() {
        let message = parse_server_message("|updateuser| Agent7|1|1|{}").unwrap();
        assert_eq!(
            message,
            ServerMessage::UpdateUser {
                username: "Agent7".to_string(),
                named: true,
                avatar: "1".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_updatechallenges() {
        let line = r#"|updatechallenges|{"challengesFrom":{"agent7":"gen9randombattle"},"challengeTo":null}"#;
        let ServerMessage::UpdateChallenges(state) = parse_server_message(line).unwrap() else {
            panic!("expected updatechallenges");
        };
        assert_eq!(
            state.challenges_from.get("agent7").map(String::as_str),
            Some("gen9randombattle")
        );
        assert!(state.challenge_to.is_none());
    }

    #[test]
    fn test_parse_init_and_error() {
        assert_eq!(
            parse_server_message("|init|battle").unwrap(),
            ServerMessage::Init(RoomType::Battle)
        );
        assert!(parse_server_message("|init|lobbyish").is_err());
        assert_eq!(
            parse_server_message("|error|[Invalid choice] Can't move: Pikachu's Surf is disabled").unwrap(),
            ServerMessage::Error("[Invalid choice] Can't move: Pikachu's Surf is disabled".to_string())
        );
    }

    #[test]
    fn test_parse_battle_init() {
        assert_eq!(
            parse_server_message("|player|p2|Opponent|102|1500").unwrap(),
            ServerMessage::BattlePlayer {
                player: Player::P2,
                username: "Opponent".to_string(),
                avatar: "102".to_string(),
                rating: Some(1500),
            }
        );
        assert_eq!(
            parse_server_message("|gametype|singles").unwrap(),
            ServerMessage::GameType(GameType::Singles)
        );
        assert_eq!(
            parse_server_message("|teamsize|p1|6").unwrap(),
            ServerMessage::TeamSize {
                player: Player::P1,
                size: 6
            }
        );
        assert!(parse_server_message("|teamsize|p1|six").is_err());
    }

    #[test]
    fn test_parse_switch() {
        let message = parse_server_message("|switch|p2a: Tusk|Great Tusk, L78|100/100").unwrap();
        let ServerMessage::Switch {
            pokemon,
            details,
            hp_status,
        } = message
        else {
            panic!("expected switch");
        };
        assert_eq!(pokemon.player, Player::P2);
        assert_eq!(pokemon.name, "Tusk");
        assert_eq!(details.species, "Great Tusk");
        assert_eq!(hp_status.unwrap().max, Some(100));
    }

    #[test]
    fn test_parse_switch_missing_pokemon() {
        assert!(parse_server_message("|switch|").is_err());
        assert!(parse_server_message("|switch|nonsense").is_err());
    }

    #[test]
    fn test_parse_move_with_tags() {
        let message =
            parse_server_message("|move|p1a: Sparky|Thunderbolt|p2a: Tusk|[miss]").unwrap();
        let ServerMessage::Move {
            move_name,
            target,
            miss,
            ..
        } = message
        else {
            panic!("expected move");
        };
        assert_eq!(move_name, "Thunderbolt");
        assert_eq!(target.unwrap().name, "Tusk");
        assert!(miss);
    }

    #[test]
    fn test_parse_damage_from_item() {
        let message =
            parse_server_message("|-damage|p1a: Sparky|90/211|[from] item: Life Orb").unwrap();
        let ServerMessage::Damage {
            hp_status, from, ..
        } = message
        else {
            panic!("expected damage");
        };
        assert_eq!(hp_status.unwrap().current, 90);
        assert_eq!(from.as_deref(), Some("item: Life Orb"));
    }

    #[test]
    fn test_parse_boost_family() {
        let boost = parse_server_message("|-boost|p1a: Sparky|spa|2").unwrap();
        assert!(matches!(
            boost,
            ServerMessage::Boost {
                stat: Stat::Spa,
                amount: 2,
                ..
            }
        ));

        let unboost = parse_server_message("|-unboost|p2a: Tusk|atk|1").unwrap();
        assert!(matches!(unboost, ServerMessage::Unboost { amount: 1, .. }));

        let setboost = parse_server_message("|-setboost|p2a: Tusk|atk|6").unwrap();
        assert!(matches!(setboost, ServerMessage::SetBoost { amount: 6, .. }));

        assert!(parse_server_message("|-boost|p1a: Sparky|luck|2").is_err());
    }

    #[test]
    fn test_parse_field_and_side() {
        assert_eq!(
            parse_server_message("|-weather|RainDance|[upkeep]").unwrap(),
            ServerMessage::Weather {
                weather: "RainDance".to_string(),
                upkeep: true
            }
        );

        let ServerMessage::SideStart { side, condition } =
            parse_server_message("|-sidestart|p1: Agent|move: Stealth Rock").unwrap()
        else {
            panic!("expected sidestart");
        };
        assert_eq!(side.player, Player::P1);
        assert_eq!(condition, "move: Stealth Rock");

        assert!(matches!(
            parse_server_message("|-sideend|p2: Opp|Reflect").unwrap(),
            ServerMessage::SideEnd { .. }
        ));
    }

    #[test]
    fn test_parse_request() {
        let line = r#"|request|{"wait":true,"side":{"name":"A","id":"p1","pokemon":[]},"rqid":2}"#;
        let ServerMessage::Request(Some(request)) = parse_server_message(line).unwrap() else {
            panic!("expected request");
        };
        assert!(request.wait);
        assert_eq!(request.rqid, Some(2));

        assert_eq!(
            parse_server_message("|request|").unwrap(),
            ServerMessage::Request(None)
        );
        assert!(parse_server_message("|request|{not json").is_err());
    }

    #[test]
    fn test_parse_turn_and_win() {
        assert_eq!(
            parse_server_message("|turn|12").unwrap(),
            ServerMessage::Turn(12)
        );
        assert!(parse_server_message("|turn|").is_err());
        assert_eq!(
            parse_server_message("|win|Agent7").unwrap(),
            ServerMessage::Win("Agent7".to_string())
        );
    }

    #[test]
    fn test_battle_delta_classification() {
        assert!(parse_server_message("|turn|3").unwrap().is_battle_delta());
        assert!(parse_server_message("|faint|p1a: Sparky").unwrap().is_battle_delta());
        assert!(!parse_server_message("|inactive|Time left: 150 sec").unwrap().is_battle_delta());
        assert!(!parse_server_message("|j| Someone").unwrap().is_battle_delta());
    }
}
