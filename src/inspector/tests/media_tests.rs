use super::doc;
use crate::inspector::dom::{Document, PageSnapshot, Viewport};
use crate::inspector::media::{aspect_ratio, extract_images};
use crate::models::ImageKind;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_context_classification() {
        let doc = doc(r#"<body>
                <img id="solo" src="/solo.png">
                <a href="/x"><span><img src="/linked.png"></span></a>
                <figure><img src="/fig.png"><figcaption>  Our   team </figcaption></figure>
                <figure><img src="/bare.png"></figure>
                <picture><img src="/pic.png"></picture>
                <div class="swiper-wrapper"><div><img src="/slide.png"></div></div>
                <section class="hero-banner"><img src="/hero.png"></section>
                <div><img src="/content.png"></div>
                <img src="data:image/png;base64,AAAA">
                <img src="">
            </body>"#);

        let images = extract_images(&doc).images;
        let contexts: Vec<_> = images
            .iter()
            .map(|img| (img.kind, img.context.as_str()))
            .collect();

        assert_eq!(
            contexts,
            vec![
                (ImageKind::Standalone, "standalone image"),
                (ImageKind::Linked, "linked image"),
                (ImageKind::Figure, "figure with caption: Our team"),
                (ImageKind::Figure, "figure"),
                (ImageKind::Content, "responsive picture"),
                (ImageKind::Carousel, "carousel/gallery image"),
                (ImageKind::Hero, "hero/banner image"),
                (ImageKind::Content, "content image"),
            ]
        );
        assert_eq!(images[0].src, "https://example.com/solo.png");
    }

    #[test]
    fn test_hero_is_largest_above_the_fold() {
        let html = r#"<body>
                <img id="a" src="/a.png" data-wg-rect="0 0 400 300" data-wg-natural="800 600">
                <img id="b" src="/b.png" data-wg-rect="0 300 600 400" data-wg-natural="600 800">
                <img id="c" src="/c.png" data-wg-rect="0 900 2000 2000" data-wg-natural="4000 4000">
                <img id="d" src="/d.png" data-wg-natural="5000 5000">
            </body>"#;
        let doc = Document::parse(&PageSnapshot::new("https://example.com/", html));

        let collection = extract_images(&doc);
        let hero = collection.hero_image.expect("hero image");
        // a and b tie on 480000 px; document order decides
        assert_eq!(hero.src, "https://example.com/a.png");
        assert_eq!(hero.kind, ImageKind::Hero);
        assert_eq!(hero.aspect_ratio, "4:3");
    }

    #[test]
    fn test_hero_respects_scroll_offset() {
        let html = r#"<body>
                <img src="/top.png" data-wg-rect="0 -500 800 400">
                <img src="/here.png" data-wg-rect="0 100 200 100">
            </body>"#;
        let snapshot = PageSnapshot::new("https://example.com/", html).with_viewport(Viewport {
            scroll_y: 600.0,
            ..Viewport::default()
        });
        let doc = Document::parse(&snapshot);

        let hero = extract_images(&doc).hero_image.expect("hero image");
        assert_eq!(hero.src, "https://example.com/top.png");
    }

    #[test]
    fn test_no_hero_without_geometry() {
        let doc = doc(r#"<img src="/a.png" width="100" height="50">"#);
        let collection = extract_images(&doc);
        assert!(collection.hero_image.is_none());
        assert_eq!(collection.images[0].width, 100);
        assert_eq!(collection.images[0].aspect_ratio, "2:1");
    }

    #[test]
    fn test_visual_treatment_attributes() {
        let doc = doc(r#"<img src="/a.png"
                style="border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,.2); object-fit: cover; filter: grayscale(1)">"#);
        let image = &extract_images(&doc).images[0];
        assert_eq!(image.border_radius, "8px");
        assert!(image.has_shadow);
        assert_eq!(image.object_fit, "cover");
        assert_eq!(image.filter, "grayscale(1)");
    }

    #[test]
    fn test_background_images() {
        let doc = doc(r#"<body>
                <div id="banner" style="background-image: url(&quot;/bg.jpg&quot;); background-size: cover"></div>
                <div style="background: url(data:image/png;base64,AA)"></div>
                <div style="display:none; background-image: url(/hidden.jpg)"></div>
            </body>"#);

        let collection = extract_images(&doc);
        assert_eq!(collection.background_images.len(), 1);
        let bg = &collection.background_images[0];
        assert_eq!(bg.url, "https://example.com/bg.jpg");
        assert_eq!(bg.element, "#banner");
        assert_eq!(bg.size, "cover");
        assert_eq!(collection.total_count, 1);
    }

    #[test]
    fn test_aspect_ratio_formats() {
        assert_eq!(aspect_ratio(1920, 1080), "16:9");
        assert_eq!(aspect_ratio(1000, 333), "3.00:1");
        assert_eq!(aspect_ratio(0, 10), "unknown");
    }
}
