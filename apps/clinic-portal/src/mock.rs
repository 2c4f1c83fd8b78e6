//! Dados ilustrativos dos painéis
//!
//! Registros fixos e fictícios usados apenas para preencher os painéis por
//! perfil; não há contrato de persistência para estas entidades.

use serde_json::{json, Value};

/// Cursos exibidos no painel do estudante
pub fn student_courses() -> Value {
    json!([
        { "id": "FAR-101", "name": "Farmacologia Básica", "progress": 72, "instructor": "Profa. H. Castro" },
        { "id": "FAR-204", "name": "Farmacotécnica", "progress": 45, "instructor": "Prof. R. Nogueira" },
        { "id": "CLI-310", "name": "Atenção Farmacêutica", "progress": 18, "instructor": "Profa. L. Dias" }
    ])
}

/// Tarefas pendentes do estudante
pub fn student_assignments() -> Value {
    json!([
        { "id": "T-18", "course": "FAR-101", "title": "Relatório de interações medicamentosas", "due_date": "2026-08-21" },
        { "id": "T-22", "course": "FAR-204", "title": "Estudo de caso: formulação pediátrica", "due_date": "2026-08-28" }
    ])
}

/// Medicações em uso exibidas ao paciente
pub fn patient_medications() -> Value {
    json!([
        { "name": "Losartana", "dose": "50 mg", "frequency": "1x ao dia", "prescriber": "Dra. M. Alves" },
        { "name": "Metformina", "dose": "850 mg", "frequency": "2x ao dia", "prescriber": "Dra. M. Alves" }
    ])
}

/// Lembretes de medicação do paciente
pub fn patient_reminders() -> Value {
    json!([
        { "medicine": "Losartana", "times": ["08:00"], "start_date": "2026-07-01", "end_date": "2026-12-31", "active": true },
        { "medicine": "Metformina", "times": ["08:00", "20:00"], "start_date": "2026-07-01", "end_date": "2026-12-31", "active": true }
    ])
}

/// Estoque exibido ao farmacêutico
pub fn pharmacist_inventory() -> Value {
    json!([
        { "item": "Dipirona 500 mg", "batch": "L2406-18", "quantity": 230, "expires_at": "2027-03-01" },
        { "item": "Amoxicilina 500 mg", "batch": "L2405-02", "quantity": 64, "expires_at": "2026-11-15" },
        { "item": "Soro fisiológico 0,9%", "batch": "L2407-11", "quantity": 410, "expires_at": "2028-01-30" }
    ])
}

/// Fila de receitas aguardando conferência
pub fn pharmacist_prescriptions() -> Value {
    json!([
        { "id": "RX-5531", "patient": "J. P.", "status": "pending_review", "received_at": "2026-08-06T14:12:00Z" },
        { "id": "RX-5532", "patient": "C. F.", "status": "pending_review", "received_at": "2026-08-07T09:40:00Z" }
    ])
}

/// Resumo de pacientes recentes para o painel do corpo clínico
pub fn doctor_roster() -> Value {
    json!([
        { "initials": "A. S.", "age": 58, "last_visit": "2026-07-30", "condition": "hipertensão essencial" },
        { "initials": "P. L.", "age": 34, "last_visit": "2026-08-02", "condition": "acompanhamento pós-operatório" },
        { "initials": "R. M.", "age": 71, "last_visit": "2026-08-05", "condition": "diabetes tipo 2" }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_payloads_are_nonempty_arrays() {
        for payload in [
            student_courses(),
            student_assignments(),
            patient_medications(),
            patient_reminders(),
            pharmacist_inventory(),
            pharmacist_prescriptions(),
            doctor_roster(),
        ] {
            assert!(payload.as_array().map(|a| !a.is_empty()).unwrap_or(false));
        }
    }
}
