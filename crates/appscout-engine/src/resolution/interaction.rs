use super::resolver::Resolver;
use super::result::ResolutionError;
use crate::descriptor::ElementDescriptor;
use crate::session::SessionError;

/// Reject empty or whitespace-only input before touching the session.
fn require_text(text: &str, what: &str) -> Result<(), ResolutionError> {
    if text.trim().is_empty() {
        return Err(ResolutionError::InvalidArgument(format!(
            "{} must not be empty",
            what
        )));
    }
    Ok(())
}

fn interaction_error(
    descriptor: &ElementDescriptor,
) -> impl FnOnce(SessionError) -> ResolutionError + '_ {
    move |source| ResolutionError::Interaction {
        description: descriptor.description.clone(),
        source,
    }
}

impl Resolver {
    pub async fn click(&self, descriptor: &ElementDescriptor) -> Result<(), ResolutionError> {
        let handle = self.resolve(descriptor, None).await?;
        self.session()
            .click(&handle)
            .await
            .map_err(interaction_error(descriptor))
    }

    pub async fn text(&self, descriptor: &ElementDescriptor) -> Result<String, ResolutionError> {
        let handle = self.resolve(descriptor, None).await?;
        self.session()
            .text(&handle)
            .await
            .map_err(interaction_error(descriptor))
    }

    /// Type `text` into the element.
    pub async fn set_value(
        &self,
        descriptor: &ElementDescriptor,
        text: &str,
    ) -> Result<(), ResolutionError> {
        require_text(text, "Input text")?;
        let handle = self.resolve(descriptor, None).await?;
        self.session()
            .set_value(&handle, text)
            .await
            .map_err(interaction_error(descriptor))
    }

    /// Clear the element, then type `text` into it.
    pub async fn replace_value(
        &self,
        descriptor: &ElementDescriptor,
        text: &str,
    ) -> Result<(), ResolutionError> {
        require_text(text, "Input text")?;
        let handle = self.resolve(descriptor, None).await?;
        let session = self.session();
        session
            .clear(&handle)
            .await
            .map_err(interaction_error(descriptor))?;
        session
            .set_value(&handle, text)
            .await
            .map_err(interaction_error(descriptor))
    }

    pub async fn clear(&self, descriptor: &ElementDescriptor) -> Result<(), ResolutionError> {
        let handle = self.resolve(descriptor, None).await?;
        self.session()
            .clear(&handle)
            .await
            .map_err(interaction_error(descriptor))
    }

    /// Wait until the element's text contains `expected`, returning the full
    /// text once it does.
    pub async fn wait_for_text(
        &self,
        descriptor: &ElementDescriptor,
        expected: &str,
    ) -> Result<String, ResolutionError> {
        require_text(expected, "Expected text")?;
        let this = self;
        self.await_condition(move || async move {
            let text = this.text(descriptor).await?;
            Ok::<_, ResolutionError>(text.contains(expected).then_some(text))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert!(require_text("Linux", "Input text").is_ok());
        assert!(matches!(
            require_text("", "Input text"),
            Err(ResolutionError::InvalidArgument(_))
        ));
        assert!(matches!(
            require_text(" \t\n", "Input text"),
            Err(ResolutionError::InvalidArgument(_))
        ));
    }
}
