use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Teacher,
    Parent,
}

impl Role {
    /// Admins pass every role gate; everyone else must match exactly.
    pub fn satisfies(self, required: Role) -> bool {
        self == required || self == Role::Admin
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Teacher => "TEACHER",
            Role::Parent => "PARENT",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "TEACHER" => Ok(Role::Teacher),
            "PARENT" => Ok(Role::Parent),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_passes_every_gate() {
        assert!(Role::Admin.satisfies(Role::Teacher));
        assert!(Role::Admin.satisfies(Role::Admin));
        assert!(Role::Teacher.satisfies(Role::Teacher));
        assert!(!Role::Teacher.satisfies(Role::Admin));
        assert!(!Role::Parent.satisfies(Role::Teacher));
    }

    #[test]
    fn roles_use_uppercase_names() {
        assert_eq!(serde_json::to_string(&Role::Teacher).unwrap(), "\"TEACHER\"");
        assert_eq!("PARENT".parse::<Role>().unwrap(), Role::Parent);
        assert!("teacher".parse::<Role>().is_err());
    }
}
