//! Incremental race ranking shown in the HUD

/// Counts how many racers are ahead of the player. Reset to first place,
/// then fed every opponent once per ranking pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RacePosAction {
    prefix: String,
    postfix: String,
    position: i32,
}

impl Default for RacePosAction {
    fn default() -> Self {
        Self::new()
    }
}

impl RacePosAction {
    pub fn new() -> Self {
        Self {
            prefix: "Pos: ".to_string(),
            postfix: String::new(),
            position: 1,
        }
    }

    pub fn reset_race_position(&mut self) {
        self.position = 1;
    }

    /// One opponent further up the road pushes the player back a place
    pub fn update_race_position(&mut self, player_y: f32, opponent_y: f32) {
        if player_y < opponent_y {
            self.position += 1;
        }
    }

    pub fn race_position(&self) -> i32 {
        self.position
    }

    /// Text after the number, e.g. "/6"
    pub fn set_postfix(&mut self, postfix: &str) {
        self.postfix = postfix.to_string();
    }

    pub fn label(&self) -> String {
        format!("{}{}{}", self.prefix, self.position, self.postfix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_counts_trucks_ahead() {
        let mut pos = RacePosAction::new();
        pos.set_postfix("/6");
        pos.reset_race_position();
        for opponent_y in [50.0, 150.0, 99.0, 100.0, 400.0] {
            pos.update_race_position(100.0, opponent_y);
        }
        assert_eq!(pos.race_position(), 3);
        assert_eq!(pos.label(), "Pos: 3/6");
        pos.reset_race_position();
        assert_eq!(pos.label(), "Pos: 1/6");
    }
}
