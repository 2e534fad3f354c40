/// Database models for Stratasec
///
/// This module contains all database models and their CRUD operations.
/// Task and comment queries are owner-scoped: the caller identity is part
/// of the WHERE clause, so a record owned by someone else behaves exactly
/// like a record that does not exist.
///
/// # Models
///
/// - `user`: User accounts and their one-to-one profile
/// - `task`: Tasks, the status transition table, filters, dashboard counts
/// - `comment`: Comments attached to a task
/// - `training`: Trainings and class sessions ("turmas")
/// - `resource`: Class-session resources and the visibility predicate
/// - `learner`: Learner records ("alunos") and enrollments ("matriculas")

pub mod comment;
pub mod learner;
pub mod resource;
pub mod task;
pub mod training;
pub mod user;
