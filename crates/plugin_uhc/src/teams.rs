//! Team registry.
//!
//! Owns team membership for the whole server. A player is in at most one team; moving
//! a player implicitly removes them from their previous team, and a team left empty by
//! a removal is dropped.

use crate::error::{TeamError, TeamResult};
use crate::types::{PlayerId, TeamColor};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    name: String,
    color: TeamColor,
    /// Join order is preserved.
    members: Vec<PlayerId>,
}

impl Team {
    fn new(name: String, color: TeamColor) -> Self {
        Self {
            name,
            color,
            members: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> TeamColor {
        self.color
    }

    pub fn members(&self) -> &[PlayerId] {
        &self.members
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.members.contains(&player)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct TeamRegistry {
    teams: Vec<Team>,
}

impl TeamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_team(&mut self, name: impl Into<String>, color: TeamColor) -> TeamResult<&Team> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(TeamError::EmptyName);
        }
        if self.team(name).is_some() {
            return Err(TeamError::AlreadyExists(name.to_string()));
        }

        debug!(team = %name, ?color, "team created");
        self.teams.push(Team::new(name.to_string(), color));
        Ok(&self.teams[self.teams.len() - 1])
    }

    pub fn remove_team(&mut self, name: &str) -> Option<Team> {
        let index = self.index_of(name)?;
        debug!(team = %name, "team removed");
        Some(self.teams.remove(index))
    }

    pub fn team(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|team| team.name == name)
    }

    pub fn team_of(&self, player: PlayerId) -> Option<&Team> {
        self.teams.iter().find(|team| team.contains(player))
    }

    /// Adds a player to a team, leaving any previous team first.
    pub fn add_player_to_team(&mut self, name: &str, player: PlayerId) -> TeamResult<()> {
        let current = self.team_of(player).map(|team| team.name.clone());
        match current {
            Some(current) if current == name => return Ok(()),
            Some(_) => {
                if self.index_of(name).is_none() {
                    return Err(TeamError::NotFound(name.to_string()));
                }
                self.remove_player_from_team(player);
            }
            None => {}
        }

        let index = self
            .index_of(name)
            .ok_or_else(|| TeamError::NotFound(name.to_string()))?;
        self.teams[index].members.push(player);
        debug!(team = %name, %player, "player joined team");
        Ok(())
    }

    /// Removes a player from their team, returning the team's name.
    pub fn remove_player_from_team(&mut self, player: PlayerId) -> Option<String> {
        let index = self.teams.iter().position(|team| team.contains(player))?;
        let team = &mut self.teams[index];
        team.members.retain(|member| *member != player);
        let name = team.name.clone();

        if team.is_empty() {
            self.teams.remove(index);
            debug!(team = %name, "empty team dropped");
        }
        Some(name)
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    /// Teams with at least one member for which `is_alive` holds.
    pub fn alive_teams<F>(&self, is_alive: F) -> Vec<&Team>
    where
        F: Fn(PlayerId) -> bool,
    {
        self.teams
            .iter()
            .filter(|team| team.members.iter().any(|member| is_alive(*member)))
            .collect()
    }

    /// Drops every team.
    pub fn clear(&mut self) {
        self.teams.clear();
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.teams.iter().position(|team| team.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(names: &[&str]) -> TeamRegistry {
        let mut registry = TeamRegistry::new();
        for name in names {
            registry
                .add_team(*name, TeamColor::White)
                .expect("team is created");
        }
        registry
    }

    #[test]
    fn test_duplicate_and_empty_names_rejected() {
        let mut registry = registry_with(&["red"]);
        assert_eq!(
            registry.add_team("red", TeamColor::Red).unwrap_err(),
            TeamError::AlreadyExists("red".into())
        );
        assert_eq!(
            registry.add_team("  ", TeamColor::Red).unwrap_err(),
            TeamError::EmptyName
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_player_moves_between_teams() {
        let mut registry = registry_with(&["red", "blue", "green"]);
        let player = PlayerId::new();
        let teammate = PlayerId::new();

        registry.add_player_to_team("red", player).unwrap();
        registry.add_player_to_team("red", teammate).unwrap();
        registry.add_player_to_team("blue", player).unwrap();

        assert_eq!(registry.team_of(player).map(Team::name), Some("blue"));
        assert!(!registry.team("red").unwrap().contains(player));
        assert!(registry.team("red").unwrap().contains(teammate));
    }

    #[test]
    fn test_player_belongs_to_at_most_one_team() {
        let mut registry = registry_with(&["a", "b", "c"]);
        let players: Vec<PlayerId> = (0..4).map(|_| PlayerId::new()).collect();
        let moves = [
            ("a", 0),
            ("b", 1),
            ("a", 1),
            ("c", 0),
            ("c", 2),
            ("a", 3),
            ("c", 1),
            ("c", 1),
        ];

        for (team, player) in moves {
            // Teams may be dropped when emptied; recreate them on demand.
            if registry.team(team).is_none() {
                registry.add_team(team, TeamColor::White).unwrap();
            }
            registry.add_player_to_team(team, players[player]).unwrap();

            for player in &players {
                let memberships = registry
                    .teams()
                    .iter()
                    .filter(|t| t.contains(*player))
                    .count();
                assert!(memberships <= 1);
            }
        }
    }

    #[test]
    fn test_moving_last_member_drops_previous_team() {
        let mut registry = registry_with(&["solo", "squad"]);
        let player = PlayerId::new();
        registry.add_player_to_team("solo", player).unwrap();
        registry.add_player_to_team("squad", player).unwrap();

        assert!(registry.team("solo").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_join_unknown_team_keeps_current_membership() {
        let mut registry = registry_with(&["red"]);
        let player = PlayerId::new();
        registry.add_player_to_team("red", player).unwrap();

        let err = registry.add_player_to_team("purple", player).unwrap_err();
        assert_eq!(err, TeamError::NotFound("purple".into()));
        assert_eq!(registry.team_of(player).map(Team::name), Some("red"));
    }

    #[test]
    fn test_remove_player_reports_team() {
        let mut registry = registry_with(&["red"]);
        let player = PlayerId::new();
        assert_eq!(registry.remove_player_from_team(player), None);

        registry.add_player_to_team("red", player).unwrap();
        assert_eq!(registry.remove_player_from_team(player), Some("red".into()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_alive_teams_filter() {
        let mut registry = registry_with(&["red", "blue", "empty"]);
        let alive = PlayerId::new();
        let dead = PlayerId::new();
        registry.add_player_to_team("red", alive).unwrap();
        registry.add_player_to_team("blue", dead).unwrap();

        let names: Vec<&str> = registry
            .alive_teams(|player| player == alive)
            .into_iter()
            .map(Team::name)
            .collect();
        assert_eq!(names, vec!["red"]);
    }

    #[test]
    fn test_clear_frees_every_player() {
        let mut registry = registry_with(&["red", "blue"]);
        let player = PlayerId::new();
        registry.add_player_to_team("red", player).unwrap();

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.team_of(player).is_none());
        assert!(registry.add_team("red", TeamColor::Red).is_ok());
    }
}
