//! Ready-made ballots and users for tests.

use voto_types::{Candidate, CandidateId, User, UserId};

pub fn candidate(id: u64, name: &str, party: &str, color: &str) -> Candidate {
    Candidate {
        id: CandidateId::new(id),
        name: name.to_string(),
        party: party.to_string(),
        color: color.to_string(),
        proposals: vec![format!("Propuesta de {name}")],
        experience: String::new(),
        votes: None,
        percentage: None,
    }
}

/// A ten-candidate ballot. Exactly two candidates (ids 3 and 8) run for
/// party `"Verde"`.
pub fn ballot() -> Vec<Candidate> {
    vec![
        candidate(1, "Lucía Fernández", "Azul", "blue"),
        candidate(2, "Martín Gómez", "Rojo", "red"),
        candidate(3, "Valentina Ruiz", "Verde", "green"),
        candidate(4, "Diego Sosa", "Amarillo", "yellow"),
        candidate(5, "Camila Torres", "Azul", "blue"),
        candidate(6, "Joaquín Díaz", "Rojo", "red"),
        candidate(7, "Sofía Romero", "Violeta", "purple"),
        candidate(8, "Tomás Verdi", "Verde", "green"),
        candidate(9, "Julieta Álvarez", "Naranja", "orange"),
        candidate(10, "Mateo Herrera", "Celeste", "lightblue"),
    ]
}

pub fn user(id: u64, name: &str, email: &str) -> User {
    User {
        id: UserId::new(id),
        name: name.to_string(),
        email: email.to_string(),
        national_id: None,
        has_voted: false,
        is_admin: false,
    }
}
