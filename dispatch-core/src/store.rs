//! In-memory dataset: users, tasks, and the append-only result log.
//!
//! Id allocation is max(existing)+1 (1 when empty), matching the historical
//! data files this engine inherits: removing the highest id makes that id
//! available again, removing any other id never does.
//!
//! Cascade rule: removing a user or task also removes every result that
//! references it. Progress records cascade too, but those live in
//! `ProgressTracker` and are cleaned up by the engine.

use crate::record::{ResultRecord, Task, User};

#[derive(Debug, Clone, Default)]
pub struct Store {
    pub users: Vec<User>,
    pub tasks: Vec<Task>,
    pub results: Vec<ResultRecord>,
}

impl Store {
    pub fn new(users: Vec<User>, tasks: Vec<Task>, results: Vec<ResultRecord>) -> Self {
        Self {
            users,
            tasks,
            results,
        }
    }

    fn next_user_id(&self) -> u32 {
        self.users.iter().map(|u| u.user_id).max().unwrap_or(0) + 1
    }

    fn next_task_id(&self) -> u32 {
        self.tasks.iter().map(|t| t.task_id).max().unwrap_or(0) + 1
    }

    pub fn user(&self, user_id: u32) -> Option<&User> {
        self.users.iter().find(|u| u.user_id == user_id)
    }

    pub fn task(&self, task_id: u32) -> Option<&Task> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    /// Insert a new user, allocating its id. Returns a clone of the record.
    pub fn add_user(&mut self, name: &str) -> User {
        let user = User {
            user_id: self.next_user_id(),
            name: name.trim().to_string(),
        };
        self.users.push(user.clone());
        user
    }

    /// Insert a new task, allocating its id. Returns a clone of the record.
    pub fn add_task(&mut self, kind: &str, complexity: f64, deadline: f64) -> Task {
        let task = Task {
            task_id: self.next_task_id(),
            kind: kind.trim().to_string(),
            complexity,
            deadline,
        };
        self.tasks.push(task.clone());
        task
    }

    /// Remove a user and every result referencing them.
    pub fn remove_user(&mut self, user_id: u32) -> Option<User> {
        let pos = self.users.iter().position(|u| u.user_id == user_id)?;
        let user = self.users.remove(pos);
        self.results.retain(|r| r.user_id != user_id);
        Some(user)
    }

    /// Remove a task and every result referencing it.
    pub fn remove_task(&mut self, task_id: u32) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| t.task_id == task_id)?;
        let task = self.tasks.remove(pos);
        self.results.retain(|r| r.task_id != task_id);
        Some(task)
    }

    pub fn push_result(&mut self, result: ResultRecord) {
        self.results.push(result);
    }

    /// True if this exact (task, user) pair already has a recorded outcome.
    pub fn has_result(&self, task_id: u32, user_id: u32) -> bool {
        self.results
            .iter()
            .any(|r| r.task_id == task_id && r.user_id == user_id)
    }

    /// True if any user has recorded an outcome for this task.
    pub fn task_has_result(&self, task_id: u32) -> bool {
        self.results.iter().any(|r| r.task_id == task_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_start_at_one_and_increase() {
        let mut s = Store::default();
        assert_eq!(s.add_user("Ava").user_id, 1);
        assert_eq!(s.add_user("Ben").user_id, 2);
        assert_eq!(s.add_task("Design", 0.5, 10.0).task_id, 1);
        assert_eq!(s.add_task("Review", 0.2, 4.0).task_id, 2);
    }

    #[test]
    fn next_id_is_max_plus_one_after_removal() {
        let mut s = Store::default();
        s.add_user("Ava");
        s.add_user("Ben");
        s.add_user("Cleo");

        // Removing a middle id does not free it.
        s.remove_user(2);
        assert_eq!(s.add_user("Dee").user_id, 4);

        // Removing the max shrinks the allocation point.
        s.remove_user(4);
        assert_eq!(s.add_user("Eli").user_id, 4);
    }

    #[test]
    fn remove_user_cascades_to_results() {
        let mut s = Store::default();
        s.add_user("Ava");
        s.add_user("Ben");
        s.add_task("Design", 0.5, 10.0);
        s.push_result(ResultRecord {
            task_id: 1,
            user_id: 1,
            time_taken: 2.0,
            quality: 4,
        });
        s.push_result(ResultRecord {
            task_id: 1,
            user_id: 2,
            time_taken: 3.0,
            quality: 3,
        });

        s.remove_user(1);
        assert!(s.user(1).is_none());
        assert_eq!(s.results.len(), 1);
        assert_eq!(s.results[0].user_id, 2);
    }

    #[test]
    fn remove_task_cascades_to_results() {
        let mut s = Store::default();
        s.add_user("Ava");
        s.add_task("Design", 0.5, 10.0);
        s.add_task("Review", 0.2, 4.0);
        s.push_result(ResultRecord {
            task_id: 1,
            user_id: 1,
            time_taken: 2.0,
            quality: 4,
        });

        s.remove_task(1);
        assert!(s.task(1).is_none());
        assert!(s.results.is_empty());
        assert!(s.task(2).is_some());
    }

    #[test]
    fn result_lookups() {
        let mut s = Store::default();
        s.add_user("Ava");
        s.add_task("Design", 0.5, 10.0);
        assert!(!s.has_result(1, 1));
        assert!(!s.task_has_result(1));

        s.push_result(ResultRecord {
            task_id: 1,
            user_id: 1,
            time_taken: 2.0,
            quality: 4,
        });
        assert!(s.has_result(1, 1));
        assert!(s.task_has_result(1));
        assert!(!s.has_result(1, 2));
    }
}
