use argon2::{
    password_hash::{
        rand_core::OsRng, Error, PasswordHasher, SaltString
    }, Argon2, PasswordHash, PasswordVerifier
};

pub fn hash_password(password:&str)->Result<String, Error>{

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2.hash_password(password.as_bytes(), salt.as_salt())?.to_string();
    Ok(password_hash)
}

pub fn verify_password(password:&str, hash:&str)->Result<(), Error>{

    let argon2 = Argon2::default();
    let parsed_hash = PasswordHash::new(&hash)?;
    argon2.verify_password(password.as_bytes(), &parsed_hash)?;

    Ok(())
}

/// Lowercase, strict URL-safe transform of a course title. Anything outside
/// `[a-z0-9]` collapses into a single `-`, with no leading or trailing dash.
pub fn slugify(title:&str)->String{

    let mut slug = String::with_capacity(title.len());

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.extend(ch.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }

    slug.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests{
    use super::*;

    #[test]
    fn slugify_lowercases_and_dashes(){
        assert_eq!(slugify("Intro to Go"), "intro-to-go");
    }

    #[test]
    fn slugify_strips_unsafe_characters(){
        assert_eq!(slugify("Rust & WebAssembly: 2024!"), "rust-webassembly-2024");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
    }

    #[test]
    fn slugify_of_symbols_only_is_empty(){
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn hash_then_verify_roundtrip(){
        let hash = hash_password("s3cret").unwrap();
        assert!(verify_password("s3cret", &hash).is_ok());
        assert!(verify_password("wrong", &hash).is_err());
    }
}
