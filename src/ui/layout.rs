use ratatui::layout::Rect;

/// Rect of at most `width`×`height`, centered in `r` with a one-cell gap.
pub fn centered_rect_abs(width: u16, height: u16, r: Rect) -> Rect {
    let w = width.min(r.width.saturating_sub(2));
    let h = height.min(r.height.saturating_sub(2));
    let x = r.x + (r.width.saturating_sub(w)) / 2;
    let y = r.y + (r.height.saturating_sub(h)) / 2;
    Rect { x, y, width: w, height: h }
}

/// First line to show so that `target` stays inside a window of `height`
/// lines, moving `current` as little as possible.
pub fn follow(current: usize, target: usize, height: usize) -> usize {
    if height == 0 {
        return target;
    }
    if target < current {
        target
    } else if target >= current + height {
        target + 1 - height
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_fits_inside() {
        let area = Rect { x: 0, y: 0, width: 80, height: 24 };
        let r = centered_rect_abs(40, 10, area);
        assert_eq!(r, Rect { x: 20, y: 7, width: 40, height: 10 });
        let tiny = centered_rect_abs(200, 200, area);
        assert_eq!((tiny.width, tiny.height), (78, 22));
    }

    #[test]
    fn follow_scrolls_minimally() {
        assert_eq!(follow(0, 5, 10), 0);
        assert_eq!(follow(0, 10, 10), 1);
        assert_eq!(follow(8, 3, 10), 3);
        assert_eq!(follow(4, 4, 0), 4);
    }
}
