//! Built-in English/Spanish vocabulary used to draft missing values.

/// One table entry: lowercase lookup phrase, English text, Spanish text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term {
    pub phrase: &'static str,
    pub en: &'static str,
    pub es: &'static str,
}

const fn term(phrase: &'static str, en: &'static str, es: &'static str) -> Term {
    Term { phrase, en, es }
}

/// Sorted by phrase for binary search.
const TERMS: &[Term] = &[
    term("active", "Active", "Activo"),
    term("add", "Add", "Agregar"),
    term("address", "Address", "Dirección"),
    term("allergies", "Allergies", "Alergias"),
    term("allergy", "Allergy", "Alergia"),
    term("appointment", "Appointment", "Cita"),
    term("appointments", "Appointments", "Citas"),
    term("back", "Back", "Atrás"),
    term("blood pressure", "Blood pressure", "Presión arterial"),
    term("cancel", "Cancel", "Cancelar"),
    term("clinic", "Clinic", "Clínica"),
    term("close", "Close", "Cerrar"),
    term("confirm", "Confirm", "Confirmar"),
    term("create", "Create", "Crear"),
    term("dashboard", "Dashboard", "Panel"),
    term("date", "Date", "Fecha"),
    term("delete", "Delete", "Eliminar"),
    term("description", "Description", "Descripción"),
    term("details", "Details", "Detalles"),
    term("diagnosis", "Diagnosis", "Diagnóstico"),
    term("doctor", "Doctor", "Médico"),
    term("edit", "Edit", "Editar"),
    term("email", "Email", "Correo electrónico"),
    term("error", "Error", "Error"),
    term("first name", "First name", "Nombre"),
    term("heart rate", "Heart rate", "Frecuencia cardíaca"),
    term("height", "Height", "Estatura"),
    term("help", "Help", "Ayuda"),
    term("history", "History", "Historial"),
    term("home", "Home", "Inicio"),
    term("hospital", "Hospital", "Hospital"),
    term("inactive", "Inactive", "Inactivo"),
    term("last name", "Last name", "Apellido"),
    term("loading", "Loading", "Cargando"),
    term("login", "Log in", "Iniciar sesión"),
    term("logout", "Log out", "Cerrar sesión"),
    term("medical history", "Medical history", "Historia clínica"),
    term("medication", "Medication", "Medicamento"),
    term("medications", "Medications", "Medicamentos"),
    term("name", "Name", "Nombre"),
    term("new", "New", "Nuevo"),
    term("next", "Next", "Siguiente"),
    term("no", "No", "No"),
    term("notes", "Notes", "Notas"),
    term("nurse", "Nurse", "Enfermero"),
    term("password", "Password", "Contraseña"),
    term("patient", "Patient", "Paciente"),
    term("patients", "Patients", "Pacientes"),
    term("phone", "Phone", "Teléfono"),
    term("prescription", "Prescription", "Receta"),
    term("previous", "Previous", "Anterior"),
    term("profile", "Profile", "Perfil"),
    term("remove", "Remove", "Quitar"),
    term("report", "Report", "Informe"),
    term("save", "Save", "Guardar"),
    term("schedule", "Schedule", "Agenda"),
    term("search", "Search", "Buscar"),
    term("settings", "Settings", "Configuración"),
    term("sign in", "Sign in", "Iniciar sesión"),
    term("sign out", "Sign out", "Cerrar sesión"),
    term("status", "Status", "Estado"),
    term("submit", "Submit", "Enviar"),
    term("success", "Success", "Éxito"),
    term("symptoms", "Symptoms", "Síntomas"),
    term("temperature", "Temperature", "Temperatura"),
    term("time", "Time", "Hora"),
    term("title", "Title", "Título"),
    term("treatment", "Treatment", "Tratamiento"),
    term("update", "Update", "Actualizar"),
    term("view", "View", "Ver"),
    term("vital signs", "Vital signs", "Signos vitales"),
    term("warning", "Warning", "Advertencia"),
    term("weight", "Weight", "Peso"),
    term("welcome", "Welcome", "Bienvenido"),
    term("yes", "Yes", "Sí"),
];

/// Languages the table can draft values for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermLanguage {
    English,
    Spanish,
}

impl TermLanguage {
    /// Maps a locale code such as `es`, `en-US` or `es_MX` to a table column.
    #[must_use]
    pub fn from_locale(locale: &str) -> Option<Self> {
        let primary = locale.split(['-', '_']).next().unwrap_or(locale);
        match primary.to_ascii_lowercase().as_str() {
            "en" => Some(Self::English),
            "es" => Some(Self::Spanish),
            _ => None,
        }
    }

    const fn pick(self, term: &Term) -> &'static str {
        match self {
            Self::English => term.en,
            Self::Spanish => term.es,
        }
    }
}

#[must_use]
pub fn lookup(phrase: &str) -> Option<&'static Term> {
    TERMS.binary_search_by(|term| term.phrase.cmp(phrase)).ok().and_then(|index| TERMS.get(index))
}

/// Splits a key segment into lowercase words on camelCase, `_` and `-`.
#[must_use]
pub fn split_words(segment: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;
    for c in segment.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = false;
            continue;
        }
        if c.is_uppercase() && previous_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        previous_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Drafts a value for `segment` from the table.
///
/// The whole segment is tried as one phrase first; otherwise every word must
/// be known and the translations are joined in key order.
#[must_use]
pub fn translate_segment(segment: &str, language: TermLanguage) -> Option<String> {
    let words = split_words(segment);
    if words.is_empty() {
        return None;
    }

    if let Some(term) = lookup(&words.join(" ")) {
        return Some(language.pick(term).to_string());
    }

    let parts = words
        .iter()
        .map(|word| lookup(word).map(|term| language.pick(term)))
        .collect::<Option<Vec<_>>>()?;
    Some(sentence_case(&parts))
}

fn sentence_case(parts: &[&str]) -> String {
    let joined = parts.iter().map(|part| part.to_lowercase()).collect::<Vec<_>>().join(" ");
    let mut chars = joined.chars();
    chars.next().map_or_else(String::new, |first| first.to_uppercase().chain(chars).collect())
}
