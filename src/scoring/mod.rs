// Live scoring — turning one login event into allow / step_up / block.

pub mod features;
pub mod live;
pub mod model;
