use domain_shared::login_code::{CodeHolder, LoginCode, CODE_ALPHABET};
use rand::distributions::Uniform;
use rand::Rng;
use std::fmt::Display;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const DEFAULT_CODE_LENGTH: usize = 5;

/// Candidates tried by [`generate_unique_code`] before giving up.
pub const MAX_UNIQUE_CODE_ATTEMPTS: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UniqueCodeError {
    #[error("No unused login code found after {0} attempts")]
    ExhaustedAttempts(usize),
    #[error("{0}")]
    Store(String),
}

/// Builds `<prefix><length random characters>`. Uniqueness is not checked.
#[instrument(level = "trace", skip(rng))]
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R, holder: CodeHolder, length: usize) -> LoginCode {
    let prefix = holder.prefix();
    let dist = Uniform::from(0..CODE_ALPHABET.len());

    let mut code = String::with_capacity(prefix.len() + length);
    code.push_str(prefix);
    for _ in 0..length {
        code.push(CODE_ALPHABET[rng.sample(&dist)] as char);
    }

    LoginCode(code)
}

/// Draws candidates until `exists_check` reports one as unused.
///
/// The check and the later write are not atomic, so a concurrent writer can
/// still claim the returned code first. The store's unique index catches that.
#[instrument(level = "debug", skip(exists_check))]
pub async fn generate_unique_code<F, Fut, E>(
    holder: CodeHolder,
    length: usize,
    mut exists_check: F,
) -> Result<LoginCode, UniqueCodeError>
where
    F: FnMut(LoginCode) -> Fut,
    Fut: Future<Output = Result<bool, E>>,
    E: Display,
{
    for attempt in 1..=MAX_UNIQUE_CODE_ATTEMPTS {
        let candidate = {
            let mut rng = rand::thread_rng();
            generate_code(&mut rng, holder, length)
        };

        let taken = exists_check(candidate.clone())
            .await
            .map_err(|err| UniqueCodeError::Store(err.to_string()))?;

        if !taken {
            debug!(attempt, "Found unused login code");
            return Ok(candidate);
        }

        debug!(attempt, "Generated login code is already taken");
    }

    warn!(
        holder = %holder,
        attempts = MAX_UNIQUE_CODE_ATTEMPTS,
        "Could not find an unused login code",
    );

    Err(UniqueCodeError::ExhaustedAttempts(MAX_UNIQUE_CODE_ATTEMPTS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::convert::Infallible;

    #[test]
    fn generated_codes_have_prefix_length_and_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);

        for holder in CodeHolder::ALL {
            for length in 1..=12 {
                let code = generate_code(&mut rng, holder, length);
                let code = code.as_str();

                assert_eq!(code.len(), holder.prefix().len() + length);
                assert!(code.starts_with(holder.prefix()));
                assert!(code[holder.prefix().len()..]
                    .bytes()
                    .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
            }
        }
    }

    #[test]
    fn same_seed_gives_same_code() {
        let first = generate_code(&mut StdRng::seed_from_u64(42), CodeHolder::Student, 5);
        let second = generate_code(&mut StdRng::seed_from_u64(42), CodeHolder::Student, 5);
        assert_eq!(first, second);
    }

    #[test]
    fn every_alphabet_character_shows_up() {
        let mut rng = StdRng::seed_from_u64(1);
        let code = generate_code(&mut rng, CodeHolder::Teacher, 5000);
        let seen: HashSet<u8> = code.as_str().bytes().skip(3).collect();
        assert_eq!(seen.len(), CODE_ALPHABET.len());
    }

    #[tokio::test]
    async fn gives_up_after_ten_taken_candidates() {
        let mut calls = 0;

        let result = generate_unique_code(CodeHolder::Teacher, DEFAULT_CODE_LENGTH, |_| {
            calls += 1;
            async { Ok::<_, Infallible>(true) }
        })
        .await;

        assert_eq!(
            result,
            Err(UniqueCodeError::ExhaustedAttempts(MAX_UNIQUE_CODE_ATTEMPTS))
        );
        assert_eq!(calls, 10);
    }

    #[tokio::test]
    async fn succeeds_on_fourth_candidate_after_three_collisions() {
        let mut taken = HashSet::new();
        let mut calls = 0;

        let code = generate_unique_code(CodeHolder::Student, DEFAULT_CODE_LENGTH, |candidate| {
            calls += 1;
            let is_taken = if taken.contains(&candidate) {
                true
            } else if taken.len() < 3 {
                taken.insert(candidate);
                true
            } else {
                false
            };
            async move { Ok::<_, Infallible>(is_taken) }
        })
        .await
        .unwrap();

        assert_eq!(calls, 4);
        assert!(!taken.contains(&code));
        assert!(code.as_str().starts_with("STD"));
    }

    #[tokio::test]
    async fn store_failure_stops_the_search() {
        let mut calls = 0;

        let result = generate_unique_code(CodeHolder::ParentProxy, 5, |_| {
            calls += 1;
            async { Err::<bool, _>("connection reset") }
        })
        .await;

        assert_eq!(
            result,
            Err(UniqueCodeError::Store("connection reset".to_string()))
        );
        assert_eq!(calls, 1);
    }
}
