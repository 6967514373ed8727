use crate::application_port::SessionError;
use crate::domain_model::*;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// In-process map of user id to signing context.
///
/// Every operation locks only the shard that owns the key, for the duration of
/// the call. Contents are lost on restart, which invalidates every outstanding
/// refresh token.
#[derive(Debug, Default)]
pub struct SecretCache {
    contexts: DashMap<UserId, SigningContext>,
}

impl SecretCache {
    pub fn new() -> Self {
        SecretCache {
            contexts: DashMap::new(),
        }
    }

    /// Replace the context of `user_id` wholesale. Rotation count restarts at 0
    /// and the refresh chain is emptied.
    pub fn put(&self, user_id: UserId, secret: SigningSecret) {
        let context = SigningContext::new(user_id.clone(), secret);
        self.contexts.insert(user_id, context);
    }

    /// Replace the context of `user_id` with one whose refresh chain already
    /// starts at `refresh_token`, in a single insert.
    pub fn install(&self, user_id: UserId, secret: SigningSecret, refresh_token: String) {
        let mut context = SigningContext::new(user_id.clone(), secret);
        context.current_refresh_token = refresh_token;
        self.contexts.insert(user_id, context);
    }

    pub fn get(&self, user_id: &UserId) -> Option<SigningContext> {
        self.contexts.get(user_id).map(|entry| entry.value().clone())
    }

    pub fn set_refresh_token(&self, user_id: &UserId, token: String) -> Result<(), SessionError> {
        let mut context = self
            .contexts
            .get_mut(user_id)
            .ok_or(SessionError::UnknownSession)?;
        context.current_refresh_token = token;
        Ok(())
    }

    pub fn increment_rotation(&self, user_id: &UserId) -> Result<u32, SessionError> {
        let mut context = self
            .contexts
            .get_mut(user_id)
            .ok_or(SessionError::UnknownSession)?;
        context.rotation_count += 1;
        Ok(context.rotation_count)
    }

    pub fn remove(&self, user_id: &UserId) -> Option<SigningContext> {
        self.contexts.remove(user_id).map(|(_, context)| context)
    }

    /// Drop every context. Returns how many were evicted.
    pub fn flush_all(&self) -> usize {
        let mut evicted = 0;
        self.contexts.retain(|_, _| {
            evicted += 1;
            false
        });
        evicted
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// One refresh step for `user_id`, executed under the entry lock.
    ///
    /// A context whose rotation count is already above `max_rotations` is
    /// evicted before `mint` runs. Otherwise `mint` sees the current context and
    /// returns its output plus the next refresh token text; on success the
    /// count is incremented and the token stored, and the new count returned.
    ///
    /// `mint` must not call back into this cache.
    pub fn rotate<T>(
        &self,
        user_id: &UserId,
        max_rotations: u32,
        mint: impl FnOnce(&SigningContext) -> Result<(T, String), SessionError>,
    ) -> Result<(T, u32), SessionError> {
        match self.contexts.entry(user_id.clone()) {
            Entry::Vacant(_) => Err(SessionError::UnknownSession),
            Entry::Occupied(mut entry) => {
                if entry.get().rotation_count > max_rotations {
                    entry.remove();
                    return Err(SessionError::RotationCeilingExceeded);
                }

                let (minted, next_refresh_token) = mint(entry.get())?;

                let context = entry.get_mut();
                context.rotation_count += 1;
                context.current_refresh_token = next_refresh_token;
                Ok((minted, context.rotation_count))
            }
        }
    }
}
