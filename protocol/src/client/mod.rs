/// Commands a client sends to the server
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    /// /trn USERNAME,0,ASSERTION
    TrustedLogin { username: String, assertion: String },

    /// /leave ROOMID
    LeaveRoom(String),

    /// /challenge USERNAME, FORMAT
    Challenge { username: String, format: String },

    /// /accept USERNAME
    Accept(String),

    /// /utm TEAM (packed team, or `null` for formats with generated teams)
    UpdateTeam(String),

    /// /search FORMAT
    Search(String),

    /// /cancelsearch
    CancelSearch,

    /// /choose CHOICE|RQID
    Choose { choice: String, rqid: Option<u64> },

    /// /forfeit
    Forfeit,

    /// /timer on|off
    Timer(bool),

    /// Raw command for catch-all
    Raw(String),
}

impl ClientCommand {
    /// Serialize command to protocol format
    pub fn to_protocol_string(&self) -> String {
        match self {
            Self::TrustedLogin {
                username,
                assertion,
            } => format!("/trn {},0,{}", username, assertion),
            Self::LeaveRoom(room) => format!("/leave {}", room),
            Self::Challenge { username, format } => format!("/challenge {}, {}", username, format),
            Self::Accept(username) => format!("/accept {}", username),
            Self::UpdateTeam(team) => format!("/utm {}", team),
            Self::Search(format) => format!("/search {}", format),
            Self::CancelSearch => "/cancelsearch".to_string(),
            Self::Choose { choice, rqid } => match rqid {
                Some(rqid) => format!("/choose {}|{}", choice, rqid),
                None => format!("/choose {}", choice),
            },
            Self::Forfeit => "/forfeit".to_string(),
            Self::Timer(on) => format!("/timer {}", if *on { "on" } else { "off" }),
            Self::Raw(command) => command.clone(),
        }
    }
}

/// Client message with optional room context
#[derive(Debug, Clone, PartialEq)]
pub struct ClientMessage {
    pub room_id: Option<String>,
    pub command: ClientCommand,
}

impl ClientMessage {
    pub fn global(command: ClientCommand) -> Self {
        Self {
            room_id: None,
            command,
        }
    }

    pub fn in_room(room_id: impl Into<String>, command: ClientCommand) -> Self {
        Self {
            room_id: Some(room_id.into()),
            command,
        }
    }

    /// Serialize to wire format: ROOMID|TEXT or |TEXT
    pub fn to_wire_format(&self) -> String {
        let text = self.command.to_protocol_string();
        match &self.room_id {
            Some(room) => format!("{}|{}", room, text),
            None => format!("|{}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_wire_format() {
        let message = ClientMessage::in_room(
            "battle-gen9randombattle-42",
            ClientCommand::Choose {
                choice: "move 2".to_string(),
                rqid: Some(5),
            },
        );
        assert_eq!(
            message.to_wire_format(),
            "battle-gen9randombattle-42|/choose move 2|5"
        );
    }

    #[test]
    fn test_global_commands() {
        let login = ClientMessage::global(ClientCommand::TrustedLogin {
            username: "Agent7".to_string(),
            assertion: String::new(),
        });
        assert_eq!(login.to_wire_format(), "|/trn Agent7,0,");

        let challenge = ClientMessage::global(ClientCommand::Challenge {
            username: "Bot7".to_string(),
            format: "gen9randombattle".to_string(),
        });
        assert_eq!(challenge.to_wire_format(), "|/challenge Bot7, gen9randombattle");

        assert_eq!(
            ClientCommand::Timer(false).to_protocol_string(),
            "/timer off"
        );
    }
}
