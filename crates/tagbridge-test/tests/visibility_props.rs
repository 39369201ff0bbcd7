//! Property tests: every read operation agrees with the visibility policy.

use proptest::prelude::*;
use tagbridge_core::policy::visible;
use tagbridge_core::{Context, Descriptor, TagService};
use tagbridge_test::{RegistryFixture, DEFAULT_TAG};

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #[test]
    fn reads_agree_with_policy(managed in any::<bool>(), pullthrough in any::<bool>()) {
        let fixture = RegistryFixture::new()
            .with_managed(managed)
            .with_pullthrough(pullthrough);
        let service = fixture.service();
        let ctx = Context::new();
        let desc = Descriptor::for_digest(fixture.digest().clone());
        let expected = visible(managed, pullthrough);

        let (get, all, lookup, untag) = block_on(async {
            (
                service.get(&ctx, DEFAULT_TAG).await,
                service.all(&ctx).await.unwrap(),
                service.lookup(&ctx, &desc).await.unwrap(),
                service.untag(&ctx, DEFAULT_TAG).await,
            )
        });

        prop_assert_eq!(get.is_ok(), expected);
        prop_assert_eq!(untag.is_ok(), expected);
        prop_assert_eq!(all.contains(&DEFAULT_TAG.to_string()), expected);
        prop_assert_eq!(lookup.len(), usize::from(expected));
    }

    #[test]
    fn tag_writes_only_visible_images(managed in any::<bool>(), pullthrough in any::<bool>()) {
        let fixture = RegistryFixture::new()
            .with_managed(managed)
            .with_pullthrough(pullthrough);
        let desc = Descriptor::for_digest(fixture.digest().clone());

        let result = block_on(fixture.service().tag(&Context::new(), "copy", desc));

        prop_assert_eq!(result.is_ok(), visible(managed, pullthrough));
        prop_assert_eq!(fixture.local().len(), usize::from(result.is_ok()));
    }
}
