//! Client-side checks applied to form payloads before they are sent.
//!
//! Messages are shown to console users as-is.

/// A form field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("Nome do usuário é obrigatório")]
    NameRequired,
    #[error("Nome deve ter entre 2 e 100 caracteres")]
    NameLength,
    #[error("Email é obrigatório")]
    EmailRequired,
    #[error("Email deve ter no máximo 50 caracteres")]
    EmailLength,
    #[error("Email inválido")]
    EmailFormat,
    #[error("Senha é obrigatória")]
    PasswordRequired,
    #[error("Senha deve ter entre 6 e 128 caracteres")]
    PasswordLength,
    #[error("Celular deve ter pelo menos 10 dígitos")]
    MobileTooShort,
    #[error("Celular deve ter no máximo 20 caracteres")]
    MobileTooLong,
    #[error("Cargo é obrigatório")]
    GroupRequired,
    #[error("Preencha todos os campos obrigatórios")]
    GroupFieldsRequired,
    #[error("O nome do cargo deve ter no máximo 10 caracteres")]
    GroupCodeLength,
    #[error("A descrição deve ter no máximo 80 caracteres")]
    GroupDescriptionLength,
}

/// Edit form: the trimmed name is 2 to 100 characters.
pub(crate) fn name(value: &str) -> Result<(), ValidationError> {
    name_length(value.trim())
}

/// Registration form: the length counts surrounding spaces, which are
/// trimmed only when the form is sent.
pub(crate) fn registration_name(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }
    name_length(value)
}

fn name_length(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::NameRequired);
    }
    if !(2..=100).contains(&value.chars().count()) {
        return Err(ValidationError::NameLength);
    }
    Ok(())
}

pub(crate) fn email(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmailRequired);
    }
    if trimmed.chars().count() > 50 {
        return Err(ValidationError::EmailLength);
    }
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(ValidationError::EmailFormat),
    }
}

pub(crate) fn password(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::PasswordRequired);
    }
    if !(6..=128).contains(&value.chars().count()) {
        return Err(ValidationError::PasswordLength);
    }
    Ok(())
}

/// Registration form: a given mobile number needs at least ten digits.
pub(crate) fn mobile_digits(value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(mobile) if mobile.chars().filter(char::is_ascii_digit).count() < 10 => {
            Err(ValidationError::MobileTooShort)
        }
        _ => Ok(()),
    }
}

/// Edit form: the formatted mobile number fits the column.
pub(crate) fn mobile_length(value: &str) -> Result<(), ValidationError> {
    if value.trim().chars().count() > 20 {
        return Err(ValidationError::MobileTooLong);
    }
    Ok(())
}

pub(crate) fn group(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::GroupRequired);
    }
    Ok(())
}

pub(crate) fn new_group(code: &str, description: &str) -> Result<(), ValidationError> {
    if code.trim().is_empty() || description.trim().is_empty() {
        return Err(ValidationError::GroupFieldsRequired);
    }
    if code.chars().count() > 10 {
        return Err(ValidationError::GroupCodeLength);
    }
    if description.chars().count() > 80 {
        return Err(ValidationError::GroupDescriptionLength);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_rules() {
        assert_eq!(name("  "), Err(ValidationError::NameRequired));
        assert_eq!(name("A"), Err(ValidationError::NameLength));
        assert_eq!(name(&"a".repeat(101)), Err(ValidationError::NameLength));
        assert!(name(" Ana ").is_ok());
        // Length counts characters, not bytes.
        assert!(name("Çé").is_ok());
    }

    #[test]
    fn test_registration_name_counts_surrounding_spaces() {
        assert_eq!(registration_name("   "), Err(ValidationError::NameRequired));
        assert!(registration_name(" A").is_ok());
        assert_eq!(name(" A"), Err(ValidationError::NameLength));
        assert_eq!(
            registration_name(&format!(" {} ", "a".repeat(99))),
            Err(ValidationError::NameLength)
        );
    }

    #[test]
    fn test_email_rules() {
        assert_eq!(email(""), Err(ValidationError::EmailRequired));
        assert_eq!(email("ana.example.com"), Err(ValidationError::EmailFormat));
        assert_eq!(email("@b.com"), Err(ValidationError::EmailFormat));
        assert_eq!(
            email(&format!("{}@b.com", "a".repeat(46))),
            Err(ValidationError::EmailLength)
        );
        assert!(email("a@b.com").is_ok());
    }

    #[test]
    fn test_password_rules() {
        assert_eq!(password("   "), Err(ValidationError::PasswordRequired));
        assert_eq!(password("12345"), Err(ValidationError::PasswordLength));
        assert_eq!(password(&"x".repeat(129)), Err(ValidationError::PasswordLength));
        assert!(password("secret1").is_ok());
    }

    #[test]
    fn test_mobile_rules() {
        assert!(mobile_digits(None).is_ok());
        assert!(mobile_digits(Some("(11) 98765-4321")).is_ok());
        assert_eq!(
            mobile_digits(Some("(11) 9876")),
            Err(ValidationError::MobileTooShort)
        );
        assert!(mobile_length("(11) 98765-4321").is_ok());
        assert_eq!(
            mobile_length("+55 (11) 98765-4321 r2"),
            Err(ValidationError::MobileTooLong)
        );
    }

    #[test]
    fn test_group_rules() {
        assert_eq!(group(" "), Err(ValidationError::GroupRequired));
        assert_eq!(new_group("", "Gerente"), Err(ValidationError::GroupFieldsRequired));
        assert_eq!(
            new_group("GERENTEGERAL", "Gerente"),
            Err(ValidationError::GroupCodeLength)
        );
        assert_eq!(
            new_group("GER", &"d".repeat(81)),
            Err(ValidationError::GroupDescriptionLength)
        );
        assert!(new_group("GER", "Gerente").is_ok());
    }
}
