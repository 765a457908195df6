use super::doc;
use crate::inspector::motion::{
    ComponentKind, ElementClassifier, HeuristicClassifier, MAX_ENTRIES, inspect,
};
use scraper::ElementRef;

/// Treats every `<aside>` as a modal and nothing else as a component
struct AsideModals;

impl ElementClassifier for AsideModals {
    fn classify(&self, element: ElementRef<'_>) -> Option<ComponentKind> {
        (element.value().name() == "aside").then_some(ComponentKind::Modal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_animations_and_transitions() {
        let doc = doc(r#"<body>
                <div class="spinner" style="animation-name: spin; animation-duration: 2s; animation-iteration-count: infinite">x</div>
                <button class="btn primary" style="transition: background-color 0.3s ease, transform 200ms">Buy</button>
                <div class="panel" style="transition: none">static</div>
                <div class="panel" style="transition-property: opacity; transition-duration: 0s">static</div>
            </body>"#);

        let (animations, _) = inspect(&doc, &HeuristicClassifier::default());

        assert_eq!(animations.css_animations.len(), 1);
        let spin = &animations.css_animations[0];
        assert_eq!(spin.element, "div.spinner");
        assert_eq!(spin.name, "spin");
        assert_eq!(spin.duration, "2s");
        assert_eq!(spin.iteration_count, "infinite");
        assert_eq!(spin.timing_function, "ease");

        assert_eq!(animations.css_transitions.len(), 1);
        let transition = &animations.css_transitions[0];
        assert_eq!(transition.element, "button.btn.primary");
        assert_eq!(transition.properties, "background-color, transform");
        assert_eq!(transition.duration, "0.3s, 200ms");

        assert_eq!(animations.hover_effects.len(), 1);
        assert_eq!(animations.hover_effects[0].element, "button.btn.primary");

        assert_eq!(
            animations.summary,
            "Detected 1 CSS animation, 1 transition effect, 1 hover effect."
        );
    }

    #[test]
    fn test_entries_are_deduplicated_and_capped() {
        let mut body = String::new();
        for _ in 0..5 {
            body.push_str(r#"<a class="card" style="transition: transform .2s">card</a>"#);
        }
        for i in 0..20 {
            body.push_str(&format!(
                r#"<div id="item{i}" class="fade-in">item</div>"#
            ));
        }
        let doc = doc(&format!("<body>{}</body>", body));

        let (animations, _) = inspect(&doc, &HeuristicClassifier::default());
        assert_eq!(animations.css_transitions.len(), 1);
        assert_eq!(animations.hover_effects.len(), 1);
        assert_eq!(animations.scroll_triggered.len(), MAX_ENTRIES);
        assert_eq!(animations.scroll_triggered[0].trigger, "fade-in");
    }

    #[test]
    fn test_scroll_triggers() {
        let doc = doc(r#"<body>
                <div id="a" data-aos="fade-up">a</div>
                <div id="b" class="section animate-on-scroll">b</div>
                <div id="c" class="plain">c</div>
            </body>"#);

        let (animations, _) = inspect(&doc, &HeuristicClassifier::default());
        let triggers: Vec<_> = animations
            .scroll_triggered
            .iter()
            .map(|s| (s.element.as_str(), s.trigger.as_str()))
            .collect();
        assert_eq!(
            triggers,
            vec![("#a", "data-aos=fade-up"), ("#b", "animate-on-scroll")]
        );
    }

    #[test]
    fn test_scroll_trigger_is_first_matching_class_in_markup() {
        let doc = doc(r#"<body><div id="d" class="slide-in fade-in-up">d</div></body>"#);

        let (animations, _) = inspect(&doc, &HeuristicClassifier::default());
        assert_eq!(animations.scroll_triggered[0].trigger, "slide-in");
    }

    #[test]
    fn test_hidden_elements_are_ignored() {
        let doc = doc(r#"<body>
                <div style="display:none"><div class="spinner" style="animation-name: spin">x</div></div>
                <div class="modal" style="opacity: 0">hidden modal</div>
            </body>"#);

        let (animations, interactive) = inspect(&doc, &HeuristicClassifier::default());
        assert!(animations.css_animations.is_empty());
        assert_eq!(interactive.modal_count, 0);
        assert_eq!(animations.summary, "No significant animations detected.");
        assert_eq!(interactive.summary, "No interactive components detected.");
    }

    #[test]
    fn test_interactive_components() {
        let doc = doc(r#"<body>
                <div class="carousel" data-ride="carousel">
                    <div class="carousel-item">1</div>
                    <div class="carousel-item">2</div>
                    <div class="carousel-item">3</div>
                </div>
                <div class="gallery-slider"><img src="/a.png"><img src="/b.png"></div>
                <div class="modal"><div class="modal-dialog">Hi</div></div>
                <dialog open>Native</dialog>
                <ul><li class="dropdown"><a aria-haspopup="true" href="/x">More</a></li></ul>
                <details><summary>Q</summary>A</details>
                <div role="tablist"><button role="tab">One</button></div>
                <video src="/clip.mp4"></video>
                <iframe src="https://www.youtube.com/embed/abc"></iframe>
            </body>"#);

        let (_, interactive) = inspect(&doc, &HeuristicClassifier::default());

        assert_eq!(interactive.carousels.len(), 2);
        assert_eq!(interactive.carousels[0].element, "div.carousel");
        assert_eq!(interactive.carousels[0].slides, 3);
        assert!(interactive.carousels[0].autoplay);
        // No slide markup: images are counted instead
        assert_eq!(interactive.carousels[1].element, "div.gallery-slider");
        assert_eq!(interactive.carousels[1].slides, 2);
        assert!(!interactive.carousels[1].autoplay);
        assert_eq!(interactive.modal_count, 2);
        assert_eq!(interactive.dropdown_count, 1);
        assert_eq!(interactive.accordion_count, 1);
        assert_eq!(interactive.tab_group_count, 1);
        assert_eq!(interactive.video_count, 2);
        assert_eq!(
            interactive.summary,
            "Interactive components: 2 carousels, 2 modals, 1 dropdown menu, 1 accordion, 1 tab group, 2 videos."
        );
    }

    #[test]
    fn test_classifier_is_pluggable() {
        let doc = doc(r#"<body>
                <div class="modal">not counted</div>
                <aside>one</aside>
                <aside>two</aside>
            </body>"#);

        let (_, interactive) = inspect(&doc, &AsideModals);
        assert_eq!(interactive.modal_count, 2);
        assert!(interactive.carousels.is_empty());
    }
}
