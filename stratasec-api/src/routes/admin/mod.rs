/// Admin-gated training catalogue endpoints
///
/// Every router in this module is mounted behind the JWT layer plus the
/// admin gate, which injects an `AdminContext`. Handlers therefore never
/// re-check the role.
///
/// - `trainings`: `/api/treinamentos` CRUD
/// - `sessions`: `/api/turmas` CRUD
/// - `resources`: `/api/recursos` CRUD
/// - `learners`: `/api/usuarios` learner-record CRUD
/// - `enrollments`: `/api/matriculas` CRUD

pub mod enrollments;
pub mod learners;
pub mod resources;
pub mod sessions;
pub mod trainings;
